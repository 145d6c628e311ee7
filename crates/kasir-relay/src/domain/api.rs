//! JSON bodies of the HTTP control surface.
//!
//! Request fields are all optional at the type level: existing backends
//! send partial bodies, and the handlers turn a missing field into a
//! `400 {"success":false,"error":"<field> is required"}` instead of a
//! deserializer error.  An empty string counts as missing.
//!
//! Every response carries `success`, so callers can branch on one field
//! without looking at the status code.

use serde::{Deserialize, Deserializer, Serialize};

/// Body of `POST /send-qr`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SendQrRequest {
    #[serde(default, deserialize_with = "string_or_number")]
    pub kasir_id: Option<String>,
    pub qr_string: Option<String>,
    pub text: Option<String>,
}

/// Body of `POST /send-payment-success`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SendPaymentSuccessRequest {
    #[serde(default, deserialize_with = "string_or_number")]
    pub kasir_id: Option<String>,
    pub qr_string: Option<String>,
    /// Defaults to `true` when absent.
    pub status: Option<bool>,
}

/// Success body of `POST /send-qr`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendQrResponse {
    pub success: bool,
    pub message: String,
    pub kasir_id: String,
    pub qr_string: String,
    pub text: String,
}

/// Success body of `POST /send-payment-success`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendPaymentSuccessResponse {
    pub success: bool,
    pub message: String,
    pub kasir_id: String,
    pub qr_string: String,
    pub status: bool,
}

/// Body of `GET /clients`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientListResponse {
    pub success: bool,
    pub count: usize,
    pub clients: Vec<String>,
}

/// Body of `GET /client/{kasir_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientStatusResponse {
    pub success: bool,
    pub kasir_id: String,
    pub connected: bool,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub success: bool,
    pub status: String,
    pub timestamp: String,
}

/// Body of every failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

/// Returns the value of a request field, or `None` if it is absent or empty.
pub fn required(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}

/// Accepts a terminal identifier sent as a JSON string or number.
///
/// Backends commonly post `{"kasir_id": 5}`; it addresses the same terminal
/// as `"5"`.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde_json::Value;

    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "kasir_id must be a string or number, got {other}"
        ))),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
