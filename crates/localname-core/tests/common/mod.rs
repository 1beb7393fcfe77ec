//! Test doubles and common utilities for sync loop contract tests
//!
//! Every double is cheaply cloneable and shares its counters between
//! clones, so a test can hand one clone to the loop and inspect another.

#![allow(dead_code)]

use localname_core::traits::{DnsUpdater, IpResolver, MetricsSink};
use localname_core::{ResolutionError, SyncLoop, SyncOptions, SyncTarget, UpdateError};
use std::collections::VecDeque;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Poll interval used by most tests
pub const POLL: Duration = Duration::from_secs(1);

pub fn ip(s: &str) -> IpAddr {
    s.parse().expect("valid test address")
}

pub fn target() -> SyncTarget {
    SyncTarget::new("home.example.com", "Z0123456789").expect("valid target")
}

/// Sleep until just after the `n`th tick following bootstrap
///
/// Intended for paused-time tests, where sleeping auto-advances the clock
/// and the loop finishes each tick before the clock moves again.
pub async fn sleep_ticks(n: u32) {
    tokio::time::sleep(POLL * n + POLL / 2).await;
}

/// An IpResolver that replays a script of results
///
/// Once the script runs out the last result is repeated.
#[derive(Clone, Default)]
pub struct ScriptedResolver {
    script: Arc<Mutex<VecDeque<Result<IpAddr, ResolutionError>>>>,
    last: Arc<Mutex<Option<Result<IpAddr, ResolutionError>>>>,
    calls: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    delay: Option<Duration>,
}

impl ScriptedResolver {
    pub fn new(script: Vec<Result<IpAddr, ResolutionError>>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into())),
            ..Default::default()
        }
    }

    /// Script of successful lookups
    pub fn ips(addrs: &[&str]) -> Self {
        Self::new(addrs.iter().map(|a| Ok(ip(a))).collect())
    }

    /// Make every lookup take `delay` before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl IpResolver for ScriptedResolver {
    async fn resolve(&self, _timeout: Duration) -> Result<IpAddr, ResolutionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let next = self.script.lock().unwrap().pop_front();
        let result = match next {
            Some(result) => {
                *self.last.lock().unwrap() = Some(result.clone());
                result
            }
            None => self
                .last
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_else(|| Err(ResolutionError::Transport("script empty".into()))),
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

/// An IpResolver that never answers
pub struct HangingResolver;

#[async_trait::async_trait]
impl IpResolver for HangingResolver {
    async fn resolve(&self, _timeout: Duration) -> Result<IpAddr, ResolutionError> {
        std::future::pending().await
    }
}

/// A DnsUpdater that records every call
///
/// Outcomes are taken from a script; an empty script means success.
#[derive(Clone, Default)]
pub struct RecordingUpdater {
    calls: Arc<Mutex<Vec<(IpAddr, SyncTarget)>>>,
    outcomes: Arc<Mutex<VecDeque<Result<(), UpdateError>>>>,
    delays: Arc<Mutex<VecDeque<Duration>>>,
    delay: Option<Duration>,
}

impl RecordingUpdater {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the next outcomes
    pub fn with_outcomes(self, outcomes: Vec<Result<(), UpdateError>>) -> Self {
        *self.outcomes.lock().unwrap() = outcomes.into();
        self
    }

    /// Make every upsert take `delay` before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Script per-call delays; unscripted calls fall back to `with_delay`
    pub fn with_delays(self, delays: Vec<Duration>) -> Self {
        *self.delays.lock().unwrap() = delays.into();
        self
    }

    /// Addresses passed to upsert, in call order
    pub fn upserted(&self) -> Vec<IpAddr> {
        self.calls.lock().unwrap().iter().map(|(ip, _)| *ip).collect()
    }

    pub fn targets(&self) -> Vec<SyncTarget> {
        self.calls.lock().unwrap().iter().map(|(_, t)| t.clone()).collect()
    }

    pub fn calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl DnsUpdater for RecordingUpdater {
    async fn upsert(
        &self,
        ip: IpAddr,
        target: &SyncTarget,
        _timeout: Duration,
    ) -> Result<(), UpdateError> {
        self.calls.lock().unwrap().push((ip, target.clone()));

        let scripted = self.delays.lock().unwrap().pop_front();
        if let Some(delay) = scripted.or(self.delay) {
            tokio::time::sleep(delay).await;
        }

        self.outcomes.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }

    fn updater_name(&self) -> &'static str {
        "recording"
    }
}

/// A MetricsSink that counts observations
#[derive(Clone, Default)]
pub struct CountingMetrics {
    pub resolves: Arc<AtomicUsize>,
    pub resolve_errors: Arc<AtomicUsize>,
    pub unchanged: Arc<AtomicUsize>,
    pub changes: Arc<AtomicUsize>,
    pub updates: Arc<AtomicUsize>,
    pub update_errors: Arc<AtomicUsize>,
}

impl CountingMetrics {
    pub fn get(counter: &Arc<AtomicUsize>) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

impl MetricsSink for CountingMetrics {
    fn resolve_completed(&self, _elapsed: Duration, ok: bool) {
        self.resolves.fetch_add(1, Ordering::SeqCst);
        if !ok {
            self.resolve_errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn ip_unchanged(&self) {
        self.unchanged.fetch_add(1, Ordering::SeqCst);
    }

    fn ip_changed(&self) {
        self.changes.fetch_add(1, Ordering::SeqCst);
    }

    fn update_completed(&self, _elapsed: Duration, ok: bool) {
        self.updates.fetch_add(1, Ordering::SeqCst);
        if !ok {
            self.update_errors.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Build a loop over clones of the given doubles
pub fn sync_loop(resolver: &ScriptedResolver, updater: &RecordingUpdater) -> SyncLoop {
    sync_loop_with_metrics(resolver, updater, &CountingMetrics::default())
}

pub fn sync_loop_with_metrics(
    resolver: &ScriptedResolver,
    updater: &RecordingUpdater,
    metrics: &CountingMetrics,
) -> SyncLoop {
    SyncLoop::new(
        Box::new(resolver.clone()),
        Box::new(updater.clone()),
        Box::new(metrics.clone()),
        SyncOptions::default(),
    )
}
