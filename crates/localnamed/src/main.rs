// # localnamed - localname Daemon
//
// This is a thin integration layer. All sync logic lives in localname-core.
//
// The localnamed daemon is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing logging, metrics and the runtime
// 3. Wiring the HTTP IP resolver and the Route 53 updater into a sync loop
// 4. Stopping the loop on SIGTERM/SIGINT
//
// ## Configuration
//
// ### Record
// - `LOCALNAME_DOMAIN`: Record to keep in sync (e.g. home.example.com)
// - `LOCALNAME_ZONE_ID`: Route 53 hosted zone ID
// - `LOCALNAME_POLL_FREQ`: Interval between checks (e.g. 30s, 5m, 1h)
//
// ### AWS
// - `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`: Required
// - `AWS_SESSION_TOKEN`: Optional
//
// ### Optional
// - `LOCALNAME_IP_SERVICE_URL`: IP echo service (default https://api.ipify.org)
// - `LOCALNAME_METRICS_ADDR`: Prometheus listener (default 0.0.0.0:8080)
// - `LOCALNAME_LOG_LEVEL`: trace, debug, info, warn, error (`RUST_LOG` wins)
//
// ## Example
//
// ```bash
// export LOCALNAME_DOMAIN=home.example.com
// export LOCALNAME_ZONE_ID=Z0123456789ABC
// export LOCALNAME_POLL_FREQ=5m
// export AWS_ACCESS_KEY_ID=...
// export AWS_SECRET_ACCESS_KEY=...
//
// localnamed
// ```

mod config;
mod telemetry;

use anyhow::Result;
use localname_core::{PrometheusMetrics, SyncLoop};
use localname_ip_http::HttpIpResolver;
use localname_provider_route53::Route53Updater;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info};

use crate::config::Config;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// How long an in-flight tick may delay shutdown
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum LocalnameExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or bootstrap failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<LocalnameExitCode> for ExitCode {
    fn from(code: LocalnameExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Why the daemon stopped early
enum DaemonError {
    /// Could not get to a running sync loop
    Startup(anyhow::Error),
    /// Failed after the sync loop was running
    Runtime(anyhow::Error),
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return LocalnameExitCode::ConfigError.into();
        }
    };

    if let Err(e) = telemetry::init_tracing(&config.log_level) {
        eprintln!("{:#}", e);
        return LocalnameExitCode::ConfigError.into();
    }

    if let Err(e) = config.validate() {
        error!("Configuration validation error: {:#}", e);
        return LocalnameExitCode::ConfigError.into();
    }

    info!("Starting localnamed {}", env!("CARGO_PKG_VERSION"));

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return LocalnameExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(run_daemon(config));

    match result {
        Ok(()) => LocalnameExitCode::CleanShutdown,
        Err(DaemonError::Startup(e)) => {
            error!("unable to start monitor: {:#}", e);
            LocalnameExitCode::ConfigError
        }
        Err(DaemonError::Runtime(e)) => {
            error!("Daemon error: {:#}", e);
            LocalnameExitCode::RuntimeError
        }
    }
    .into()
}

/// Run the daemon
async fn run_daemon(config: Config) -> std::result::Result<(), DaemonError> {
    telemetry::start_metrics_exporter(config.metrics_addr).map_err(DaemonError::Startup)?;

    let target = config
        .sync
        .target()
        .map_err(|e| DaemonError::Startup(e.into()))?;

    let resolver = HttpIpResolver::from_config(&config.sync.resolver)
        .map_err(|e| DaemonError::Startup(e.into()))?;
    let updater = Route53Updater::from_config(config.credentials, &config.sync.updater)
        .map_err(|e| DaemonError::Startup(e.into()))?;

    info!("IP service: {}", resolver.url());

    let sync = SyncLoop::new(
        Box::new(resolver),
        Box::new(updater),
        Box::new(PrometheusMetrics::new()),
        config.sync.sync_options(),
    );

    // Bootstrap runs here; failure means the record may be stale
    let handle = sync
        .start(target, config.sync.poll_interval())
        .await
        .map_err(|e| DaemonError::Startup(e.into()))?;

    info!("Monitoring {} every {:?}", config.sync.hostname, config.sync.poll_interval());

    let signal = wait_for_shutdown().await.map_err(DaemonError::Runtime);

    // Stop the loop on every path, including signal setup failure
    let shutdown = tokio::time::timeout(SHUTDOWN_TIMEOUT, handle.shutdown()).await;

    let signal = signal?;
    info!("Received shutdown signal: {}", signal);

    if shutdown.is_err() {
        return Err(DaemonError::Runtime(anyhow::anyhow!(
            "sync loop did not stop within {:?}",
            SHUTDOWN_TIMEOUT
        )));
    }

    info!("Shutdown complete");
    Ok(())
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    let name = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };

    Ok(name)
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;

    Ok("SIGINT")
}
