//! Core traits for the localname system
//!
//! This module defines the seams between the sync loop and the outside world.
//!
//! - [`IpResolver`]: Discover the public IP address
//! - [`DnsUpdater`]: Upsert the managed DNS record
//! - [`MetricsSink`]: Record observations

pub mod ip_resolver;
pub mod dns_updater;
pub mod metrics_sink;

pub use ip_resolver::{IpResolver, parse_ip_payload};
pub use dns_updater::{DnsUpdater, RecordType, DEFAULT_RECORD_TTL};
pub use metrics_sink::{MetricsSink, NoopMetrics};
