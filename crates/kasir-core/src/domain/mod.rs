//! Domain entities for the kasir relay.
//!
//! This module contains pure business types with no infrastructure
//! dependencies: no sockets, no async runtime, no environment access.
//! Code in the relay's outer layers depends on the domain, but the domain
//! never depends on them.

/// Terminal identity, the routing key for every notification.
pub mod terminal;

pub use terminal::{EmptyTerminalId, TerminalId};
