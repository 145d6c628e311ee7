//! HTTP control surface and the router that also serves the WebSocket upgrade.
//!
//! | Route                        | Handler                  |
//! |------------------------------|--------------------------|
//! | `GET /`, `GET /ws`           | WebSocket upgrade        |
//! | `POST /send-qr`              | [`send_qr`]              |
//! | `POST /send-payment-success` | [`send_payment_success`] |
//! | `GET /clients`               | [`list_clients`]         |
//! | `GET /client/{kasir_id}`     | [`client_status`]        |
//! | `GET /health`                | [`health`]               |
//! | `GET /favicon.ico`           | 204                      |
//!
//! POST bodies may be JSON or url-encoded forms.  Every failure is a
//! `{"success":false,"error":"..."}` body with a matching status code.

use axum::extract::{FromRequest, Path, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use kasir_core::protocol::iso_timestamp_now;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::application::DeliveryError;
use crate::domain::api::{
    required, ClientListResponse, ClientStatusResponse, ErrorResponse, HealthResponse,
    SendPaymentSuccessRequest, SendPaymentSuccessResponse, SendQrRequest, SendQrResponse,
};
use crate::domain::RelayConfig;
use crate::infrastructure::app_state::AppState;
use crate::infrastructure::ws_session::ws_upgrade_handler;

// ── Router ────────────────────────────────────────────────────────────────────

/// Builds the full router: WebSocket endpoint plus the HTTP API.
pub fn build_router(state: AppState, config: &RelayConfig) -> Router {
    Router::new()
        .route("/", get(ws_upgrade_handler))
        .route("/ws", get(ws_upgrade_handler))
        .route("/send-qr", post(send_qr))
        .route("/send-payment-success", post(send_payment_success))
        .route("/clients", get(list_clients))
        .route("/client/{kasir_id}", get(client_status))
        .route("/health", get(health))
        .route("/favicon.ico", get(favicon))
        .fallback(not_found)
        .layer(cors_layer(config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(config: &RelayConfig) -> CorsLayer {
    let origin = if config.cors_allows_any_origin() {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!("ignoring invalid CORS origin {origin:?}");
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

// ── Errors ────────────────────────────────────────────────────────────────────

/// Failure of an HTTP API request.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing field or unparseable body.
    #[error("{0}")]
    BadRequest(String),

    /// No such route.
    #[error("Not found")]
    NotFound,

    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Delivery(DeliveryError::NotConnected { .. }) => StatusCode::NOT_FOUND,
            ApiError::Delivery(DeliveryError::DeliveryFailed { .. }) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

// ── Body extractor ────────────────────────────────────────────────────────────

/// Request body parsed as JSON or as a url-encoded form, by content type.
///
/// A request with neither content type yields `T::default()`, so the handler
/// reports the first missing field instead of a content-type error.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonOrForm<T>(pub T);

impl<S, T> FromRequest<S> for JsonOrForm<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Default + Send,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(body) = Form::<T>::from_request(req, state)
                .await
                .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
            Ok(Self(body))
        } else if content_type.contains("json") {
            let Json(body) = Json::<T>::from_request(req, state)
                .await
                .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
            Ok(Self(body))
        } else {
            Ok(Self(T::default()))
        }
    }
}

// ── Handlers ──────────────────────────────────────────────────────────────────

/// `POST /send-qr`
pub async fn send_qr(
    State(state): State<AppState>,
    JsonOrForm(req): JsonOrForm<SendQrRequest>,
) -> Result<Json<SendQrResponse>, ApiError> {
    let kasir_id = required_field(&req.kasir_id, "kasir_id")?;
    let qr_string = required_field(&req.qr_string, "qr_string")?;
    let text = req.text.as_deref().unwrap_or_default();

    state.gateway.send_qr(kasir_id, qr_string, text).await?;

    if text.is_empty() {
        info!("QR sent to Kasir {kasir_id}: {qr_string}");
    } else {
        info!("QR sent to Kasir {kasir_id}: {qr_string} | Text: {text}");
    }

    Ok(Json(SendQrResponse {
        success: true,
        message: format!("QR string sent to Kasir {kasir_id}"),
        kasir_id: kasir_id.to_string(),
        qr_string: qr_string.to_string(),
        text: text.to_string(),
    }))
}

/// `POST /send-payment-success`
pub async fn send_payment_success(
    State(state): State<AppState>,
    JsonOrForm(req): JsonOrForm<SendPaymentSuccessRequest>,
) -> Result<Json<SendPaymentSuccessResponse>, ApiError> {
    let kasir_id = required_field(&req.kasir_id, "kasir_id")?;
    let qr_string = required_field(&req.qr_string, "qr_string")?;
    let status = req.status.unwrap_or(true);

    state
        .gateway
        .send_payment_success(kasir_id, qr_string, status)
        .await?;

    info!("payment success sent to Kasir {kasir_id}: {qr_string} (status={status})");

    Ok(Json(SendPaymentSuccessResponse {
        success: true,
        message: format!("Payment success sent to Kasir {kasir_id}"),
        kasir_id: kasir_id.to_string(),
        qr_string: qr_string.to_string(),
        status,
    }))
}

/// `GET /clients`
pub async fn list_clients(State(state): State<AppState>) -> Json<ClientListResponse> {
    let clients: Vec<String> = state
        .gateway
        .list_connected()
        .await
        .into_iter()
        .map(|id| id.to_string())
        .collect();

    Json(ClientListResponse {
        success: true,
        count: clients.len(),
        clients,
    })
}

/// `GET /client/{kasir_id}`
pub async fn client_status(
    State(state): State<AppState>,
    Path(kasir_id): Path<String>,
) -> Json<ClientStatusResponse> {
    let connected = state.gateway.is_connected(&kasir_id).await;
    Json(ClientStatusResponse {
        success: true,
        kasir_id,
        connected,
    })
}

/// `GET /health`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        success: true,
        status: "running".to_string(),
        timestamp: iso_timestamp_now(),
    })
}

async fn favicon() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}

fn required_field<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, ApiError> {
    required(value).ok_or_else(|| ApiError::BadRequest(format!("{name} is required")))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
