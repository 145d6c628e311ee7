//! Delivery gateway: push notifications to terminals by identity.
//!
//! This is what the HTTP control surface calls.  It never touches a socket:
//! it resolves the identity in the registry and queues the message on the
//! session's writer channel.  When the identity has no open session nothing
//! is written anywhere.

use std::sync::Arc;

use kasir_core::{ServerMessage, TerminalId};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::application::registry::SessionRegistry;
use crate::application::session::SendError;

/// Why a notification was not delivered.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// No open session is registered for the identity.
    #[error("Kasir {kasir_id} is not connected")]
    NotConnected { kasir_id: String },

    /// A session exists but the message could not be queued on it.
    #[error("failed to deliver to Kasir {kasir_id}: {source}")]
    DeliveryFailed {
        kasir_id: String,
        #[source]
        source: SendError,
    },
}

/// Routes notifications to registered sessions.  Cheap to clone.
#[derive(Debug, Clone)]
pub struct DeliveryGateway {
    registry: Arc<SessionRegistry>,
}

impl DeliveryGateway {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }

    /// Delivers `msg` to the session registered for `kasir_id`.
    ///
    /// # Errors
    ///
    /// - [`DeliveryError::NotConnected`] if no open session exists.
    /// - [`DeliveryError::DeliveryFailed`] if the session closed between
    ///   lookup and send, or its writer has exited.
    pub async fn send_notification(
        &self,
        kasir_id: &str,
        msg: &ServerMessage,
    ) -> Result<(), DeliveryError> {
        let session = match self.registry.lookup(kasir_id).await {
            Some(session) if session.is_open() => session,
            _ => {
                debug!(kasir_id, kind = msg.kind(), "no open session; dropping");
                return Err(DeliveryError::NotConnected {
                    kasir_id: kasir_id.to_string(),
                });
            }
        };

        match session.send(msg) {
            Ok(()) => {
                info!(kasir_id, kind = msg.kind(), "notification sent");
                Ok(())
            }
            // Closed between lookup and send: the caller sees it as gone.
            Err(SendError::NotOpen(_)) => Err(DeliveryError::NotConnected {
                kasir_id: kasir_id.to_string(),
            }),
            Err(source) => {
                warn!(kasir_id, kind = msg.kind(), "delivery failed: {source}");
                Err(DeliveryError::DeliveryFailed {
                    kasir_id: kasir_id.to_string(),
                    source,
                })
            }
        }
    }

    /// Sends a `qr_code` notification.
    pub async fn send_qr(
        &self,
        kasir_id: &str,
        qr_string: &str,
        text: &str,
    ) -> Result<(), DeliveryError> {
        self.send_notification(kasir_id, &ServerMessage::qr_code(qr_string, text))
            .await
    }

    /// Sends a `payment_success` notification.
    pub async fn send_payment_success(
        &self,
        kasir_id: &str,
        qr_string: &str,
        status: bool,
    ) -> Result<(), DeliveryError> {
        self.send_notification(kasir_id, &ServerMessage::payment_success(qr_string, status))
            .await
    }

    /// Whether an open session is registered for `kasir_id`.  No side effects.
    pub async fn is_connected(&self, kasir_id: &str) -> bool {
        self.registry
            .lookup(kasir_id)
            .await
            .is_some_and(|s| s.is_open())
    }

    /// Identities with an open session, in unspecified order.
    pub async fn list_connected(&self) -> Vec<TerminalId> {
        self.registry.list_connected().await
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
