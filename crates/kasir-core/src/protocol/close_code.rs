//! WebSocket close codes used by the relay.
//!
//! Codes in the 4000-4999 range are reserved by RFC 6455 for application use.
//! Terminals switch on these values to decide whether reconnecting can help:
//! a rejected handshake will be rejected again until the terminal's own
//! configuration changes, while a supersede or a liveness timeout is
//! transient.

/// The upgrade URL carried no `kasir_id`.
pub const MISSING_IDENTIFIER: u16 = 4001;

/// The secret did not match the configured digest.
pub const INVALID_SECRET: u16 = 4002;

/// The `kasir_id` is not on the allow-list.
pub const IDENTIFIER_NOT_ALLOWED: u16 = 4003;

/// A newer connection registered the same `kasir_id`.
pub const SUPERSEDED: u16 = 4000;

/// Standard "going away" code, sent on liveness timeout and server shutdown.
pub const GOING_AWAY: u16 = 1001;

/// Close reason text for [`SUPERSEDED`].
pub const SUPERSEDED_REASON: &str = "superseded by a newer connection";

/// Close reason text for a liveness timeout.
pub const LIVENESS_TIMEOUT_REASON: &str = "liveness timeout";

/// Close reason text for server shutdown.
pub const SHUTDOWN_REASON: &str = "server shutting down";
