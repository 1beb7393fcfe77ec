// # DNS Updater Trait
//
// Defines the interface for pointing the managed record at an address.
//
// ## Implementations
//
// - AWS Route 53: `localname-provider-route53` crate
//
// ## Usage
//
// ```rust,ignore
// use localname_core::{DnsUpdater, SyncTarget};
// use std::time::Duration;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let updater = /* DnsUpdater implementation */;
//     let target = SyncTarget::new("home.example.com", "Z0123456789")?;
//
//     updater
//         .upsert("203.0.113.5".parse()?, &target, Duration::from_secs(5))
//         .await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::net::IpAddr;
use std::time::Duration;

use crate::error::UpdateError;
use crate::target::SyncTarget;

/// Operational TTL for the managed record, in seconds
///
/// Short so that the next change propagates quickly.
pub const DEFAULT_RECORD_TTL: u32 = 60;

/// Address record type implied by an IP address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordType {
    /// IPv4 address record
    A,
    /// IPv6 address record
    Aaaa,
}

impl RecordType {
    /// Record type matching the address family of `ip`
    pub fn for_ip(ip: IpAddr) -> Self {
        match ip {
            IpAddr::V4(_) => RecordType::A,
            IpAddr::V6(_) => RecordType::Aaaa,
        }
    }

    /// Wire name used by DNS provider APIs
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
        }
    }
}

/// Trait for DNS provider implementations
///
/// # Semantics
///
/// `upsert` inserts the address record for `target.hostname()` in
/// `target.zone_id()` or replaces it, leaving `ip` as its sole value.
/// There is no distinct create/update outcome. Repeating a call with the
/// same address is harmless.
///
/// # Rules for implementations
///
/// - One provider call per invocation, bounded by `timeout`.
/// - No retries or backoff; the sync loop retries on its next tick.
/// - No caching of what the record currently holds. Whether an update is
///   needed is decided by the sync loop.
/// - Never log credentials.
#[async_trait]
pub trait DnsUpdater: Send + Sync {
    /// Point the target record at `ip`
    ///
    /// # Returns
    ///
    /// - `Ok(())`: The provider accepted the change
    /// - `Err(UpdateError)`: Timeout, rejection, or provider failure
    async fn upsert(
        &self,
        ip: IpAddr,
        target: &SyncTarget,
        timeout: Duration,
    ) -> Result<(), UpdateError>;

    /// Provider name, for logs
    fn updater_name(&self) -> &'static str;
}
