//! Shared state handed to every axum handler.

use std::sync::Arc;

use kasir_core::CredentialVerifier;

use crate::application::{DeliveryGateway, SessionRegistry};

/// Everything the HTTP and WebSocket handlers need.  Cheap to clone.
#[derive(Debug, Clone)]
pub struct AppState {
    pub registry: Arc<SessionRegistry>,
    pub gateway: DeliveryGateway,
    pub verifier: Arc<CredentialVerifier>,
}

impl AppState {
    pub fn new(registry: Arc<SessionRegistry>, verifier: CredentialVerifier) -> Self {
        Self {
            gateway: DeliveryGateway::new(Arc::clone(&registry)),
            registry,
            verifier: Arc::new(verifier),
        }
    }
}
