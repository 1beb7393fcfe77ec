// # Metrics Sink Trait
//
// The observability capability injected into the sync loop. Keeping it a
// trait means the loop can be driven in tests without a metrics backend.

use std::time::Duration;

/// Receiver of sync loop observations
///
/// Calls are made from the bootstrap path and from the single background
/// task. Implementations must tolerate concurrent use but never influence
/// control flow.
pub trait MetricsSink: Send + Sync {
    /// One IP lookup finished
    fn resolve_completed(&self, elapsed: Duration, ok: bool);

    /// A tick resolved the address already applied
    fn ip_unchanged(&self);

    /// A tick resolved an address different from the applied one
    fn ip_changed(&self);

    /// One DNS upsert finished
    fn update_completed(&self, elapsed: Duration, ok: bool);
}

/// Sink that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn resolve_completed(&self, _elapsed: Duration, _ok: bool) {}
    fn ip_unchanged(&self) {}
    fn ip_changed(&self) {}
    fn update_completed(&self, _elapsed: Duration, _ok: bool) {}
}
