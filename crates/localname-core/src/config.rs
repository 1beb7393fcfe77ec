//! Configuration types for the localname system
//!
//! This module defines the configuration consumed by the sync loop and its
//! adapters. Loading (environment, files) is the embedding binary's job.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::sync::SyncOptions;
use crate::target::SyncTarget;
use crate::traits::DEFAULT_RECORD_TTL;

/// Default IP lookup service (plain-text body)
pub const DEFAULT_IP_SERVICE_URL: &str = "https://api.ipify.org";

/// Main localname configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Record to keep in sync (e.g., "home.example.com")
    pub hostname: String,

    /// Hosted zone containing the record
    pub zone_id: String,

    /// Seconds between IP checks
    pub poll_interval_secs: u64,

    /// IP lookup settings
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// DNS update settings
    #[serde(default)]
    pub updater: UpdaterConfig,
}

impl SyncConfig {
    /// Create a configuration with default adapter settings
    pub fn new(
        hostname: impl Into<String>,
        zone_id: impl Into<String>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            hostname: hostname.into(),
            zone_id: zone_id.into(),
            poll_interval_secs: poll_interval.as_secs(),
            resolver: ResolverConfig::default(),
            updater: UpdaterConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.target()?;

        if self.poll_interval_secs == 0 {
            return Err(Error::config("poll interval must be > 0"));
        }

        self.resolver.validate()?;
        self.updater.validate()?;

        Ok(())
    }

    /// The validated record target
    pub fn target(&self) -> Result<SyncTarget> {
        SyncTarget::new(self.hostname.clone(), self.zone_id.clone())
    }

    /// Interval between ticks
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Per-call deadlines for the sync loop
    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            resolve_timeout: Duration::from_secs(self.resolver.timeout_secs),
            update_timeout: Duration::from_secs(self.updater.timeout_secs),
        }
    }
}

/// IP lookup configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// URL returning the caller's address as the response body
    #[serde(default = "default_service_url")]
    pub url: String,

    /// Deadline for one lookup, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ResolverConfig {
    /// Validate the resolver configuration
    pub fn validate(&self) -> Result<()> {
        if self.url.is_empty() {
            return Err(Error::config("IP service URL cannot be empty"));
        }
        if !self.url.starts_with("https://") && !self.url.starts_with("http://") {
            return Err(Error::config(format!(
                "IP service URL must use HTTP or HTTPS scheme. Got: {}",
                self.url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(Error::config("IP service timeout must be > 0"));
        }
        Ok(())
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            url: default_service_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// DNS update configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdaterConfig {
    /// TTL written on the record, in seconds
    #[serde(default = "default_ttl")]
    pub ttl: u32,

    /// Deadline for one update, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Comment attached to each change, where the provider supports it
    #[serde(default = "default_comment")]
    pub comment: String,
}

impl UpdaterConfig {
    /// Validate the updater configuration
    pub fn validate(&self) -> Result<()> {
        if self.ttl == 0 {
            return Err(Error::config("record TTL must be > 0"));
        }
        if self.timeout_secs == 0 {
            return Err(Error::config("DNS update timeout must be > 0"));
        }
        Ok(())
    }
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            ttl: default_ttl(),
            timeout_secs: default_timeout_secs(),
            comment: default_comment(),
        }
    }
}

fn default_service_url() -> String {
    DEFAULT_IP_SERVICE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    5
}

fn default_ttl() -> u32 {
    DEFAULT_RECORD_TTL
}

fn default_comment() -> String {
    "updated by localname".to_string()
}
