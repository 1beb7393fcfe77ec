//! Logging and metrics setup

use anyhow::{Context, Result};
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Install the global tracing subscriber
///
/// `RUST_LOG` wins over `log_level` when set.
pub fn init_tracing(log_level: &str) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .context("failed to set tracing subscriber")
}

/// Serve Prometheus metrics on `addr`
///
/// Must be called from within the tokio runtime.
pub fn start_metrics_exporter(addr: SocketAddr) -> Result<()> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .with_context(|| format!("failed to start metrics exporter on {}", addr))?;

    info!(%addr, "Prometheus metrics exporter started");

    Ok(())
}
