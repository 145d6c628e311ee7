//! JSON message types sent from the relay to a terminal.
//!
//! Every message is a JSON object with a `"type"` discriminant; all other
//! fields sit beside it in the same object.  For example:
//!
//! ```json
//! {"type":"qr_code","qr_string":"QR123","text":"Pay now","timestamp":"2024-05-01T09:30:00.000Z"}
//! ```
//!
//! Serde's `#[serde(tag = "type")]` produces this shape directly.
//!
//! Terminals may also send text frames to the relay.  Those are not typed:
//! the relay only parses them as JSON for logging (see
//! [`decode_inbound`](super::codec::decode_inbound)).

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::TerminalId;

/// All messages the relay can push to a terminal.
///
/// # Serde representation
///
/// ```json
/// {"type":"connected","message":"Welcome Kasir 5","kasir_id":"5"}
/// {"type":"qr_code","qr_string":"QR123","text":"","timestamp":"..."}
/// {"type":"payment_success","qr_string":"QR123","status":true,"timestamp":"..."}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Welcome sent once, right after a successful handshake.
    Connected {
        /// Human-readable greeting.
        message: String,
        /// The identity the session was registered under.
        kasir_id: TerminalId,
    },

    /// A QR payment code to display.
    QrCode {
        /// The QR payload string (for example a QRIS string).
        qr_string: String,
        /// Optional caption shown next to the code; empty when not given.
        text: String,
        /// ISO-8601 UTC time the relay built the message.
        timestamp: String,
    },

    /// Notification that the payment for a QR code went through.
    PaymentSuccess {
        /// The QR payload the payment belongs to.
        qr_string: String,
        /// Payment outcome flag as reported by the backend.
        status: bool,
        /// ISO-8601 UTC time the relay built the message.
        timestamp: String,
    },
}

impl ServerMessage {
    /// Builds the welcome message for a freshly registered terminal.
    pub fn welcome(kasir_id: &TerminalId) -> Self {
        ServerMessage::Connected {
            message: format!("Welcome Kasir {kasir_id}"),
            kasir_id: kasir_id.clone(),
        }
    }

    /// Builds a `qr_code` message stamped with the current time.
    pub fn qr_code(qr_string: impl Into<String>, text: impl Into<String>) -> Self {
        ServerMessage::QrCode {
            qr_string: qr_string.into(),
            text: text.into(),
            timestamp: iso_timestamp_now(),
        }
    }

    /// Builds a `payment_success` message stamped with the current time.
    pub fn payment_success(qr_string: impl Into<String>, status: bool) -> Self {
        ServerMessage::PaymentSuccess {
            qr_string: qr_string.into(),
            status,
            timestamp: iso_timestamp_now(),
        }
    }

    /// The value of the `"type"` field, for log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            ServerMessage::Connected { .. } => "connected",
            ServerMessage::QrCode { .. } => "qr_code",
            ServerMessage::PaymentSuccess { .. } => "payment_success",
        }
    }
}

/// Current UTC time as ISO-8601 with millisecond precision and a `Z` suffix,
/// e.g. `2024-05-01T09:30:00.123Z`.
pub fn iso_timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn to_value(msg: &ServerMessage) -> Value {
        serde_json::to_value(msg).expect("server messages always serialize")
    }

    #[test]
    fn test_welcome_carries_identifier_and_greeting() {
        let id = TerminalId::parse("5").unwrap();

        let value = to_value(&ServerMessage::welcome(&id));

        assert_eq!(
            value,
            json!({"type": "connected", "message": "Welcome Kasir 5", "kasir_id": "5"})
        );
    }

    #[test]
    fn test_qr_code_uses_snake_case_type_tag() {
        let value = to_value(&ServerMessage::qr_code("QR123", "Pay now"));

        assert_eq!(value["type"], "qr_code");
        assert_eq!(value["qr_string"], "QR123");
        assert_eq!(value["text"], "Pay now");
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn test_payment_success_carries_status() {
        let value = to_value(&ServerMessage::payment_success("QR9", false));

        assert_eq!(value["type"], "payment_success");
        assert_eq!(value["status"], false);
    }

    #[test]
    fn test_kind_matches_serialized_type() {
        let id = TerminalId::parse("1").unwrap();
        for msg in [
            ServerMessage::welcome(&id),
            ServerMessage::qr_code("a", ""),
            ServerMessage::payment_success("a", true),
        ] {
            assert_eq!(to_value(&msg)["type"], msg.kind());
        }
    }

    #[test]
    fn test_iso_timestamp_has_millis_and_z_suffix() {
        let ts = iso_timestamp_now();

        // 2024-05-01T09:30:00.123Z
        assert_eq!(ts.len(), 24, "unexpected timestamp shape: {ts}");
        assert!(ts.ends_with('Z'));
        assert_eq!(&ts[19..20], ".");
    }
}
