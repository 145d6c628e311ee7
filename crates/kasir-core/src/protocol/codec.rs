//! Text-frame codec for the terminal protocol.
//!
//! Outbound messages are serialized to a single JSON text frame.  Inbound
//! frames carry no schema the relay depends on, so they are only parsed into
//! a generic JSON value; anything that is not JSON is reported as
//! [`ProtocolError::MalformedInbound`] for the caller to log and drop.

use thiserror::Error;

use crate::protocol::messages::ServerMessage;

/// Errors produced while encoding or decoding frames.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// An outbound message could not be serialized.
    #[error("failed to encode {kind} message: {source}")]
    Encode {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// An inbound frame was not valid JSON.
    #[error("malformed inbound message: {0}")]
    MalformedInbound(#[source] serde_json::Error),
}

/// Serializes a [`ServerMessage`] into the text of one WebSocket frame.
///
/// # Errors
///
/// Returns [`ProtocolError::Encode`] if serialization fails, which for the
/// current message set only happens on allocator failure.
///
/// # Example
///
/// ```rust
/// use kasir_core::protocol::{encode_server_message, ServerMessage};
///
/// let text = encode_server_message(&ServerMessage::payment_success("QR1", true)).unwrap();
/// assert!(text.contains(r#""type":"payment_success""#));
/// ```
pub fn encode_server_message(msg: &ServerMessage) -> Result<String, ProtocolError> {
    serde_json::to_string(msg).map_err(|source| ProtocolError::Encode {
        kind: msg.kind(),
        source,
    })
}

/// Parses an inbound text frame as JSON.
///
/// # Errors
///
/// Returns [`ProtocolError::MalformedInbound`] if the text is not JSON.
pub fn decode_inbound(text: &str) -> Result<serde_json::Value, ProtocolError> {
    serde_json::from_str(text).map_err(ProtocolError::MalformedInbound)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
