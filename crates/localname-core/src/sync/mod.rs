//! Core sync loop
//!
//! The SyncLoop is responsible for:
//! - Establishing an initial, DNS-consistent address (bootstrap)
//! - Re-checking the public IP on a fixed interval
//! - Upserting the record only when the address changed
//! - Keeping the last successfully applied address
//!
//! ## Architecture
//!
//! ```text
//!                 start()
//!                    │
//!                    ▼
//!          ┌───────────────────┐  resolve / upsert fail
//!          │   Bootstrapping   │──────────────────────────▶ Err(BootstrapError)
//!          └───────────────────┘
//!                    │ both succeed
//!                    ▼
//!          ┌───────────────────┐
//!          │    Monitoring     │◀──┐ every poll interval:
//!          │ (background task) │───┘ resolve → compare → maybe upsert
//!          └───────────────────┘
//!                    │ SyncHandle::cancel()
//!                    ▼
//!                 stopped
//! ```
//!
//! ## Failure policy
//!
//! A failure during bootstrap is returned to the caller and nothing is left
//! running. Any failure after that is logged, recorded, and retried on the
//! next tick; it never stops the task. Only cancellation does.
//!
//! ## Sync state
//!
//! The applied address is owned by the background task and is advanced only
//! after the provider accepted the upsert for it. A failed upsert leaves it
//! untouched, so the next tick sees the same difference and tries again.

use std::net::IpAddr;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::{BootstrapError, Error, ResolutionError, Result, UpdateError};
use crate::target::SyncTarget;
use crate::traits::{DnsUpdater, IpResolver, MetricsSink};

/// Per-call deadlines applied by the loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    /// Deadline for one IP lookup
    pub resolve_timeout: Duration,
    /// Deadline for one DNS upsert
    pub update_timeout: Duration,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            resolve_timeout: Duration::from_secs(5),
            update_timeout: Duration::from_secs(5),
        }
    }
}

/// Keeps one DNS record pointed at the host's public IP
///
/// ## Lifecycle
///
/// 1. Create with [`SyncLoop::new()`]
/// 2. Call [`SyncLoop::start()`]; bootstrap runs in the caller's task
/// 3. On success a single background task monitors until cancelled
/// 4. Stop with [`SyncHandle::cancel()`] or [`SyncHandle::shutdown()`]
pub struct SyncLoop {
    /// IP discovery
    resolver: Box<dyn IpResolver>,

    /// Record upserts
    updater: Box<dyn DnsUpdater>,

    /// Observations
    metrics: Box<dyn MetricsSink>,

    /// Call deadlines
    options: SyncOptions,
}

impl SyncLoop {
    /// Create a new sync loop
    ///
    /// # Parameters
    ///
    /// - `resolver`: IP resolver implementation
    /// - `updater`: DNS updater implementation
    /// - `metrics`: Observability sink (use [`crate::NoopMetrics`] to discard)
    /// - `options`: Deadlines for each external call
    pub fn new(
        resolver: Box<dyn IpResolver>,
        updater: Box<dyn DnsUpdater>,
        metrics: Box<dyn MetricsSink>,
        options: SyncOptions,
    ) -> Self {
        Self {
            resolver,
            updater,
            metrics,
            options,
        }
    }

    /// Bootstrap the record and start monitoring
    ///
    /// Resolves the current address and pushes it to DNS before returning.
    /// If either step fails the error is returned as
    /// [`Error::Bootstrap`] and no task is spawned. On success the
    /// returned handle controls the single background task.
    ///
    /// Must be called within a tokio runtime.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`]: `poll_interval` is zero
    /// - [`Error::Bootstrap`]: the initial lookup or upsert failed
    pub async fn start(self, target: SyncTarget, poll_interval: Duration) -> Result<SyncHandle> {
        if poll_interval.is_zero() {
            return Err(Error::config("poll interval must be > 0"));
        }

        info!(
            "Starting sync for {} using {} (interval={:?})",
            target,
            self.updater.updater_name(),
            poll_interval
        );

        let ip = self
            .resolve()
            .await
            .map_err(BootstrapError::Resolution)?;
        info!("Initial IP: {}", ip);

        self.update(ip, &target)
            .await
            .map_err(BootstrapError::Update)?;
        info!("Bootstrap complete: {} -> {}", target.hostname(), ip);

        let cancel = CancellationToken::new();
        let (applied_tx, applied_rx) = watch::channel(ip);

        let monitor = Monitor {
            sync: self,
            target,
            applied: ip,
            applied_tx,
            cancel: cancel.clone(),
        };
        let task = tokio::spawn(monitor.run(poll_interval));

        Ok(SyncHandle {
            cancel,
            task: Some(task),
            applied: applied_rx,
        })
    }

    /// One bounded lookup
    async fn resolve(&self) -> std::result::Result<IpAddr, ResolutionError> {
        let deadline = self.options.resolve_timeout;
        let started = Instant::now();

        let result = match tokio::time::timeout(deadline, self.resolver.resolve(deadline)).await {
            Ok(result) => result.map(|ip| ip.to_canonical()),
            Err(_) => Err(ResolutionError::Timeout(deadline)),
        };

        self.metrics.resolve_completed(started.elapsed(), result.is_ok());
        result
    }

    /// One bounded upsert
    async fn update(
        &self,
        ip: IpAddr,
        target: &SyncTarget,
    ) -> std::result::Result<(), UpdateError> {
        let deadline = self.options.update_timeout;
        let started = Instant::now();

        let result =
            match tokio::time::timeout(deadline, self.updater.upsert(ip, target, deadline)).await {
                Ok(result) => result,
                Err(_) => Err(UpdateError::Timeout(deadline)),
            };

        self.metrics.update_completed(started.elapsed(), result.is_ok());
        result
    }
}

/// State owned by the background task
struct Monitor {
    sync: SyncLoop,
    target: SyncTarget,
    /// Last address the provider accepted
    applied: IpAddr,
    applied_tx: watch::Sender<IpAddr>,
    cancel: CancellationToken,
}

impl Monitor {
    async fn run(mut self, poll_interval: Duration) {
        // First tick one full interval after bootstrap, not immediately
        let mut ticker = tokio::time::interval_at(Instant::now() + poll_interval, poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            // Cancellation wins at a tick boundary. A call already in flight
            // completes within its deadline; nothing new starts after it.
            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => {
                    info!("Sync for {} cancelled", self.target);
                    break;
                }

                _ = ticker.tick() => self.tick().await,
            }
        }
    }

    /// Resolve, compare, and upsert on change
    async fn tick(&mut self) {
        let ip = match self.sync.resolve().await {
            Ok(ip) => ip,
            Err(e) => {
                warn!("unable to get external IP: {}", e);
                return;
            }
        };

        if self.cancel.is_cancelled() {
            debug!("Cancelled during lookup, skipping {}", ip);
            return;
        }

        if ip == self.applied {
            debug!("External IP unchanged: {}", ip);
            self.sync.metrics.ip_unchanged();
            return;
        }

        info!("External IP address changed: {} -> {}", self.applied, ip);
        self.sync.metrics.ip_changed();

        match self.sync.update(ip, &self.target).await {
            Ok(()) => {
                info!("Updated {} -> {}", self.target.hostname(), ip);
                self.applied = ip;
                self.applied_tx.send_replace(ip);
            }
            Err(e) => {
                // Applied address stays put so the next tick retries
                warn!("unable to update DNS: {}", e);
            }
        }
    }
}

/// Control over a running sync loop
///
/// Cancelling is idempotent and safe at any time, including after the task
/// has already stopped. Dropping the handle cancels the task.
#[derive(Debug)]
pub struct SyncHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
    applied: watch::Receiver<IpAddr>,
}

impl SyncHandle {
    /// Signal the background task to stop at its next tick boundary
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Whether the background task has exited
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(|task| task.is_finished())
    }

    /// Address most recently accepted by the DNS provider
    pub fn applied_ip(&self) -> IpAddr {
        *self.applied.borrow()
    }

    /// Cancel and wait for the background task to exit
    pub async fn shutdown(mut self) {
        self.cancel();

        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                if e.is_panic() {
                    error!("Sync task panicked: {}", e);
                }
            }
        }
    }
}

impl Drop for SyncHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
