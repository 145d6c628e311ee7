//! kasir-relay library crate.
//!
//! This crate provides a real-time relay that pushes QR codes and payment
//! results from a backend to point-of-sale terminals ("kasir") over
//! WebSocket.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! Backend (HTTP POST)            Terminals (WebSocket, ?kasir_id=..&secret=..)
//!         ↓                                   ↕
//! [kasir-relay]
//!   ├── domain/           Pure types: RelayConfig, SessionState, API bodies
//!   ├── application/      Handshake, SessionRegistry, DeliveryGateway,
//!   │                     LivenessMonitor
//!   └── infrastructure/
//!         ├── http_api/   axum router and handlers
//!         ├── ws_session/ per-terminal reader/writer tasks
//!         └── server/     listener, monitor task, graceful shutdown
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no I/O and no async.
//! - `application` depends on `domain` and `kasir-core`, plus `tokio` sync
//!   primitives; it never touches a socket.
//! - `infrastructure` depends on all other layers plus `axum`.

/// Domain layer: pure configuration and lifecycle types (no I/O).
pub mod domain;

/// Application layer: session lifecycle, registry, and delivery.
pub mod application;

/// Infrastructure layer: HTTP API, WebSocket transport, and server assembly.
pub mod infrastructure;
