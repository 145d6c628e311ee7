//! Application layer for kasir-relay.
//!
//! The application layer owns the session lifecycle and notification routing:
//! it knows *what* happens to a connection, but leaves sockets and HTTP to the
//! infrastructure layer.
//!
//! # Responsibilities
//!
//! - The per-connection handshake and close path ([`lifecycle`])
//! - The registry of live sessions, one per terminal ([`registry`])
//! - Delivering notifications by terminal identity ([`gateway`])
//! - Probing sessions and evicting dead ones ([`liveness`])
//!
//! # What does NOT belong here?
//!
//! - Accepting connections or upgrading to WebSocket (that is infrastructure)
//! - HTTP routing and request parsing (also infrastructure)
//! - Wire message definitions (those live in `kasir-core`)

pub mod gateway;
pub mod lifecycle;
pub mod liveness;
pub mod registry;
pub mod session;

pub use gateway::{DeliveryError, DeliveryGateway};
pub use lifecycle::{close_session, ConnectParams, Handshake, Registration};
pub use liveness::{LivenessMonitor, TickReport};
pub use registry::SessionRegistry;
pub use session::{Outbound, SendError, Session, SessionHandle};
