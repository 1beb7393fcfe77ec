// # localname-core
//
// Core library for keeping a DNS record pointed at a host's public IP.
//
// ## Architecture Overview
//
// - **IpResolver**: Trait for discovering the current public address
// - **DnsUpdater**: Trait for upserting the address record
// - **MetricsSink**: Trait for recording observations
// - **SyncLoop**: Bootstraps the record, then re-checks on an interval and
//   upserts only on change
//
// ## Design Principles
//
// 1. **Fail loudly at startup**: bootstrap errors are returned to the caller
// 2. **Self-heal afterwards**: steady-state errors are logged and retried
//    on the next tick
// 3. **Single owner**: the applied address lives in one background task
// 4. **Library-First**: the daemon is a thin layer over this crate

pub mod traits;
pub mod sync;
pub mod target;
pub mod config;
pub mod error;
pub mod metrics;

// Re-export core types for convenience
pub use traits::{DnsUpdater, IpResolver, MetricsSink, NoopMetrics};
pub use sync::{SyncHandle, SyncLoop, SyncOptions};
pub use target::SyncTarget;
pub use config::{ResolverConfig, SyncConfig, UpdaterConfig};
pub use error::{BootstrapError, BootstrapPhase, Error, ResolutionError, Result, UpdateError};
pub use metrics::PrometheusMetrics;
