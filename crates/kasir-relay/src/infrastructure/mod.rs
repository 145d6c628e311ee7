//! Infrastructure layer for kasir-relay.
//!
//! The infrastructure layer handles all I/O: the TCP listener, HTTP routing,
//! WebSocket framing, and reading the configuration file.
//!
//! # Responsibilities
//!
//! - Binding the listener and running axum ([`server`])
//! - Upgrading terminal connections and running their reader/writer tasks
//!   ([`ws_session`])
//! - The HTTP control surface and its error responses ([`http_api`])
//! - Parsing the optional TOML file ([`config_file`])
//! - Handling the graceful shutdown signal
//!
//! # What does NOT belong here?
//!
//! - Session lifecycle and routing rules (that is the application layer)
//! - Wire message definitions (`kasir-core`)
//! - Command-line parsing (that is done in `main.rs`)

pub mod app_state;
pub mod config_file;
pub mod http_api;
pub mod server;
pub mod ws_session;

// Re-export the primary entry points so `main.rs` can call them concisely.
pub use app_state::AppState;
pub use config_file::{ConfigError, FileConfig};
pub use http_api::{build_router, ApiError};
pub use server::{run_server, serve};
