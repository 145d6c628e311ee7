//! # kasir-core
//!
//! Shared foundation of the kasir relay: terminal identity, credential
//! verification, and the JSON messages pushed to terminals.
//!
//! This crate has no dependency on sockets, async runtimes, or HTTP
//! frameworks, so everything in it is testable in isolation.
//!
//! - **`domain`** – [`TerminalId`], the routing key of every notification.
//! - **`auth`** – [`CredentialVerifier`]: allow-list plus SHA-256 secret
//!   digest check, and the [`RejectReason`] a failed handshake closes with.
//! - **`protocol`** – [`ServerMessage`], its JSON codec, and the WebSocket
//!   close codes the relay uses.

pub mod auth;
pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `kasir_core::TerminalId` instead of `kasir_core::domain::terminal::TerminalId`.
pub use auth::{CredentialVerifier, RejectReason};
pub use domain::TerminalId;
pub use protocol::{encode_server_message, ProtocolError, ServerMessage};
