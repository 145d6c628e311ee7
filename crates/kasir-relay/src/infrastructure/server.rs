//! Server assembly: listener, shared state, liveness monitor, and shutdown.
//!
//! One listener serves both the HTTP API and the WebSocket endpoint.  The
//! registry is built here, once, and shared by reference with every
//! component; nothing about it is global.
//!
//! # Shutdown
//!
//! When the `shutdown` watch flips to `true`:
//!
//! 1. axum stops accepting connections.
//! 2. The liveness monitor exits its loop.
//! 3. Every registered session is drained from the registry and sent close
//!    code 1001, so terminals reconnect elsewhere instead of timing out.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use kasir_core::protocol::close_code;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::application::{LivenessMonitor, SessionRegistry};
use crate::domain::RelayConfig;
use crate::infrastructure::app_state::AppState;
use crate::infrastructure::http_api::build_router;

/// Binds `config.bind_addr` and serves until `shutdown` becomes `true`.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound, the configured secret
/// digest is invalid, or the HTTP server fails.
pub async fn run_server(config: RelayConfig, shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind listener on {}", config.bind_addr))?;

    serve(listener, config, shutdown).await
}

/// Serves on an already-bound listener until `shutdown` becomes `true`.
///
/// Tests bind `127.0.0.1:0` themselves and call this directly.
///
/// # Errors
///
/// Returns an error if the configured secret digest is invalid or the HTTP
/// server fails.
pub async fn serve(
    listener: TcpListener,
    config: RelayConfig,
    shutdown: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    let verifier = config
        .credential_verifier()
        .context("invalid terminal secret configuration")?;
    let local_addr = listener
        .local_addr()
        .context("failed to read listener address")?;

    let registry = Arc::new(SessionRegistry::new());
    let state = AppState::new(Arc::clone(&registry), verifier);

    log_banner(local_addr, &config, &state);

    let app = build_router(state, &config);

    let monitor = LivenessMonitor::new(Arc::clone(&registry), config.ping_interval);
    let monitor_task = tokio::spawn(monitor.run(shutdown.clone()));

    let mut shutdown_signal = shutdown;
    let drain_registry = Arc::clone(&registry);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            // A dropped sender also ends the server.
            let _ = shutdown_signal.wait_for(|stop| *stop).await;
            close_all_sessions(&drain_registry).await;
        })
        .await
        .context("HTTP server error")?;

    if let Err(e) = monitor_task.await {
        warn!("liveness monitor task failed: {e}");
    }

    info!("kasir relay stopped");
    Ok(())
}

/// Drains the registry and tells every terminal the server is going away.
async fn close_all_sessions(registry: &SessionRegistry) {
    let sessions = registry.drain().await;
    if sessions.is_empty() {
        return;
    }

    info!("closing {} terminal session(s)", sessions.len());
    for session in sessions {
        session.terminate(close_code::GOING_AWAY, close_code::SHUTDOWN_REASON);
    }
}

fn log_banner(addr: SocketAddr, config: &RelayConfig, state: &AppState) {
    let auth = match (state.verifier.has_allow_list(), state.verifier.requires_secret()) {
        (false, false) => "open",
        (true, false) => "allow-list",
        (false, true) => "shared secret",
        (true, true) => "allow-list + shared secret",
    };

    let lines = [
        format!("kasir relay v{}", env!("CARGO_PKG_VERSION")),
        format!("HTTP API : http://{addr}"),
        format!("WebSocket: ws://{addr}/?kasir_id=YOUR_KASIR_ID"),
        format!("auth: {auth}, ping every {:?}", config.ping_interval),
        "POST /send-qr              Send QR to kasir".to_string(),
        "POST /send-payment-success Send payment result".to_string(),
        "GET  /clients              List connected kasir".to_string(),
        "GET  /client/{id}          Check kasir connection".to_string(),
        "GET  /health               Health check".to_string(),
    ];
    let width = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0) + 4;
    info!("┌{}┐", "─".repeat(width));
    for line in &lines {
        info!("│  {:<w$}│", line, w = width - 2);
    }
    info!("└{}┘", "─".repeat(width));
}
