// # localname-echo - IP Echo Service
//
// Answers `GET /ip` with the caller's address as seen by the fronting proxy
// or load balancer, taken from the `X-Forwarded-For` header. This is the
// service localnamed can point LOCALNAME_IP_SERVICE_URL at.
//
// ## Responses
//
// - 200 with the address and a trailing newline
// - 400 when the header is missing or is not a single IP literal
//
// Both carry `Access-Control-Allow-Origin: *` so browsers can call it.
//
// ## Configuration
//
// - `PORT`: Port to listen on (required)
// - `RUST_LOG`: Log filter (default info)
//
// Stops gracefully on SIGTERM or SIGINT.

use anyhow::{Context, Result};
use axum::Router;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use std::future::Future;
use std::net::{IpAddr, SocketAddr};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Build the service router
fn router() -> Router {
    Router::new().route("/ip", get(echo_ip))
}

/// Handler for `GET /ip`
async fn echo_ip(headers: HeaderMap) -> Response {
    let cors = [(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    )];

    match forwarded_ip(&headers) {
        Some(ip) => (cors, format!("{}\n", ip)).into_response(),
        None => {
            debug!("Rejecting request without a usable X-Forwarded-For header");
            (StatusCode::BAD_REQUEST, cors, ()).into_response()
        }
    }
}

/// The single address in `X-Forwarded-For`, if there is exactly one
fn forwarded_ip(headers: &HeaderMap) -> Option<IpAddr> {
    let value = headers.get("x-forwarded-for")?.to_str().ok()?;
    let ip: IpAddr = value.trim().parse().ok()?;
    Some(ip.to_canonical())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let port: u16 = std::env::var("PORT")
        .context("environment variable PORT is required")?
        .parse()
        .context("PORT must be a port number")?;

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    // Installed before serving so a failure stops startup
    let shutdown = shutdown_signal()?;

    info!("localname-echo listening on {}", addr);

    axum::serve(listener, router())
        .with_graceful_shutdown(async move {
            let name = shutdown.await;
            info!("Received shutdown signal: {}", name);
        })
        .await
        .context("server error")?;

    info!("Shutdown complete");
    Ok(())
}

/// Install SIGTERM and SIGINT handlers
///
/// The returned future resolves with the name of the first signal received.
#[cfg(unix)]
fn shutdown_signal() -> Result<impl Future<Output = &'static str>> {
    let mut sigterm = signal(SignalKind::terminate()).context("Failed to setup SIGTERM handler")?;
    let mut sigint = signal(SignalKind::interrupt()).context("Failed to setup SIGINT handler")?;

    Ok(async move {
        tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        }
    })
}

/// Wait for CTRL-C
///
/// Fallback implementation for non-Unix platforms. A handler that cannot be
/// installed is logged and the server keeps running.
#[cfg(not(unix))]
fn shutdown_signal() -> Result<impl Future<Output = &'static str>> {
    Ok(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to wait for CTRL-C: {}", e);
            std::future::pending::<()>().await;
        }
        "SIGINT"
    })
}
