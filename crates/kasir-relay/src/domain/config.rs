//! Relay configuration types.
//!
//! [`RelayConfig`] is the single source of truth for all runtime settings.
//! It is built once at startup from CLI arguments, environment variables, and
//! an optional TOML file (see `main.rs` and
//! [`crate::infrastructure::config_file`]), then handed to
//! [`crate::infrastructure::run_server`].
//!
//! Keeping configuration as a plain struct (no global state, no environment
//! reads inside the domain) makes the relay easy to embed in tests.

use std::net::SocketAddr;
use std::time::Duration;

use kasir_core::auth::{CredentialError, CredentialVerifier};
use kasir_core::TerminalId;

/// Default HTTP + WebSocket port.
pub const DEFAULT_PORT: u16 = 3001;

/// Default liveness probe period.
pub const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(30);

/// All runtime configuration for the relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    /// Address the HTTP API and WebSocket endpoint listen on.
    pub bind_addr: SocketAddr,

    /// How often the liveness monitor probes every open session.
    ///
    /// A session that misses two consecutive probes is terminated, so the
    /// effective dead-peer timeout is between one and two periods.
    pub ping_interval: Duration,

    /// Terminal identifiers allowed to connect.  `None` allows any.
    pub allowed_kasir: Option<Vec<String>>,

    /// Hex SHA-256 digest of the shared terminal secret.  `None` disables
    /// the secret check.
    pub secret_sha256: Option<String>,

    /// Origins allowed by CORS on the HTTP API.  Empty, or containing `*`,
    /// allows any origin.
    pub cors_origins: Vec<String>,
}

impl RelayConfig {
    /// Builds the credential verifier described by this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError`] if `secret_sha256` is not a valid
    /// 64-character hex digest.
    pub fn credential_verifier(&self) -> Result<CredentialVerifier, CredentialError> {
        let mut verifier = CredentialVerifier::open();

        if let Some(ids) = &self.allowed_kasir {
            verifier = verifier.with_allow_list(ids.iter().filter_map(|id| TerminalId::parse(id)));
        }
        if let Some(digest_hex) = &self.secret_sha256 {
            verifier = verifier.with_secret_digest_hex(digest_hex)?;
        }

        Ok(verifier)
    }

    /// Whether CORS should allow every origin.
    pub fn cors_allows_any_origin(&self) -> bool {
        self.cors_origins.is_empty() || self.cors_origins.iter().any(|o| o == "*")
    }
}

impl Default for RelayConfig {
    /// Returns a `RelayConfig` suitable for local development: all
    /// interfaces on port 3001, 30 s probes, no authentication, any origin.
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            ping_interval: DEFAULT_PING_INTERVAL,
            allowed_kasir: None,
            secret_sha256: None,
            cors_origins: Vec::new(),
        }
    }
}

/// Splits a comma-separated list, trimming entries and dropping empty ones.
///
/// Returns `None` when nothing remains, so an empty environment variable
/// behaves like an unset one.
pub fn split_list(raw: &str) -> Option<Vec<String>> {
    let items: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
