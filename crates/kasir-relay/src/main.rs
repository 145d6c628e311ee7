//! Kasir relay: entry point.
//!
//! This binary accepts WebSocket connections from point-of-sale terminals and
//! exposes an HTTP API that a payment backend calls to push a QR code or a
//! payment result to one terminal by its identifier.
//!
//! # Usage
//!
//! ```text
//! kasir-relay [OPTIONS]
//!
//! Options:
//!   --host <HOST>             Bind address [default: 0.0.0.0]
//!   --port <PORT>             HTTP + WebSocket port [default: 3001]
//!   --ping-interval <SECS>    Liveness probe period [default: 30]
//!   --allowed-kasir <IDS>     Comma-separated terminal allow-list
//!   --secret-sha256 <HEX>     SHA-256 of the shared terminal secret
//!   --cors-origins <ORIGINS>  Comma-separated CORS origins [default: any]
//!   --config <PATH>           TOML configuration file
//! ```
//!
//! # Environment variable overrides
//!
//! Every option can also be set through the environment.  CLI args take
//! precedence when both are present, and both take precedence over the
//! configuration file.
//!
//! | Variable              | Default   | Description                     |
//! |-----------------------|-----------|---------------------------------|
//! | `HOST`                | `0.0.0.0` | Bind address                    |
//! | `PORT`                | `3001`    | HTTP + WebSocket port           |
//! | `KASIR_PING_INTERVAL` | `30`      | Liveness probe period (secs)    |
//! | `KASIR_ALLOWED_IDS`   | unset     | Terminal allow-list             |
//! | `KASIR_SECRET_SHA256` | unset     | Shared secret digest (hex)      |
//! | `KASIR_CORS_ORIGINS`  | unset     | CORS origins                    |
//! | `KASIR_CONFIG`        | unset     | Path to the TOML config file    |

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

use kasir_relay::domain::config::{split_list, DEFAULT_PING_INTERVAL, DEFAULT_PORT};
use kasir_relay::domain::RelayConfig;
use kasir_relay::infrastructure::{run_server, FileConfig};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Real-time QR and payment notification relay for POS terminals.
///
/// Every option is optional so that unset flags fall through to the config
/// file and then to the built-in defaults.
#[derive(Debug, Default, Parser)]
#[command(
    name = "kasir-relay",
    about = "WebSocket relay that pushes QR codes and payment events to POS terminals",
    version
)]
struct Cli {
    /// IP address to bind the HTTP + WebSocket listener to.
    ///
    /// `0.0.0.0` accepts connections on every interface.
    #[arg(long, env = "HOST")]
    host: Option<String>,

    /// Port for the HTTP API and the WebSocket endpoint.
    #[arg(long, env = "PORT")]
    port: Option<u16>,

    /// Liveness probe period in seconds.
    ///
    /// A terminal that misses two consecutive probes is disconnected.
    #[arg(long, env = "KASIR_PING_INTERVAL")]
    ping_interval: Option<u64>,

    /// Comma-separated list of terminal identifiers allowed to connect.
    #[arg(long, env = "KASIR_ALLOWED_IDS")]
    allowed_kasir: Option<String>,

    /// Hex SHA-256 digest of the shared terminal secret.
    #[arg(long, env = "KASIR_SECRET_SHA256", hide_env_values = true)]
    secret_sha256: Option<String>,

    /// Comma-separated list of origins allowed by CORS.
    #[arg(long, env = "KASIR_CORS_ORIGINS")]
    cors_origins: Option<String>,

    /// Path to a TOML configuration file.
    #[arg(long, env = "KASIR_CONFIG")]
    config: Option<PathBuf>,
}

impl Cli {
    /// Loads the configuration file named by `--config`, if any.
    fn load_file(&self) -> anyhow::Result<FileConfig> {
        match &self.config {
            Some(path) => Ok(FileConfig::load(path)?),
            None => Ok(FileConfig::default()),
        }
    }

    /// Merges CLI/env values over `file` into a [`RelayConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if the host is not an IP address or the ping interval
    /// is zero.
    fn into_relay_config(self, file: FileConfig) -> anyhow::Result<RelayConfig> {
        let host = self
            .host
            .or(file.host)
            .unwrap_or_else(|| "0.0.0.0".to_string());
        let ip: IpAddr = host
            .parse()
            .with_context(|| format!("invalid bind address: '{host}'"))?;
        let port = self.port.or(file.port).unwrap_or(DEFAULT_PORT);

        let ping_interval = match self.ping_interval.or(file.ping_interval_secs) {
            Some(0) => anyhow::bail!("ping interval must be at least 1 second"),
            Some(secs) => Duration::from_secs(secs),
            None => DEFAULT_PING_INTERVAL,
        };

        // An empty list from any source leaves the allow-list unset.
        let allowed_kasir = match self.allowed_kasir {
            Some(raw) => split_list(&raw),
            None => file
                .allowed_kasir
                .and_then(|ids| split_list(&ids.join(","))),
        };
        let secret_sha256 = self
            .secret_sha256
            .or(file.secret_sha256)
            .filter(|s| !s.trim().is_empty());
        let cors_origins = match self.cors_origins {
            Some(raw) => split_list(&raw).unwrap_or_default(),
            None => file.cors_origins.unwrap_or_default(),
        };

        Ok(RelayConfig {
            bind_addr: SocketAddr::new(ip, port),
            ping_interval,
            allowed_kasir,
            secret_sha256,
            cors_origins,
        })
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// Program entry point.
///
/// 1. `tracing_subscriber` is initialised; `RUST_LOG` overrides the default
///    `info` level.
/// 2. CLI arguments (with env fallbacks) are parsed and merged over the
///    optional config file into a [`RelayConfig`].
/// 3. A Ctrl+C handler flips the shutdown watch channel.
/// 4. [`run_server`] serves until shutdown.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let file = cli.load_file()?;
    let config = cli.into_relay_config(file)?;

    info!("kasir relay starting on {}", config.bind_addr);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C, shutting down");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => {
                tracing::error!("failed to listen for Ctrl+C signal: {e}");
            }
        }
    });

    run_server(config, shutdown_rx).await
}

// ── Tests ─────────────────────────────────────────────────────────────────────
