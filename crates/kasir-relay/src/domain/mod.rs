//! Domain layer for kasir-relay.
//!
//! Pure types with no I/O: the relay configuration, session lifecycle
//! states, and the JSON bodies of the HTTP control surface.  No `tokio`,
//! sockets, or environment reads belong here.

pub mod api;
pub mod config;
pub mod session;

pub use config::RelayConfig;
pub use session::{SessionId, SessionState};
