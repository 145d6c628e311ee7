//! Handshake state machine and session close path.
//!
//! A connection walks the lifecycle in [`crate::domain::session`]:
//!
//! 1. [`Handshake::new`] starts in `Connecting`.
//! 2. [`Handshake::accept`] records the upgrade's query parameters and moves
//!    to `Authenticating`.
//! 3. [`Handshake::authenticate`] either rejects (→ `Closed`, with the close
//!    code the transport must send) or yields the terminal identity.
//! 4. [`Handshake::register`] creates the [`Session`], queues the welcome,
//!    inserts it into the registry, and closes any session it superseded.
//! 5. [`close_session`] runs when the transport ends for any reason:
//!    `Registered → Closing`, compare-and-remove, `→ Closed`.
//!
//! Every transition for a given connection happens on that connection's own
//! task, so the events of one session never interleave.

use kasir_core::protocol::close_code;
use kasir_core::{CredentialVerifier, RejectReason, ServerMessage, TerminalId};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::application::registry::SessionRegistry;
use crate::application::session::{Outbound, Session, SessionHandle};
use crate::domain::SessionState;

/// Connection parameters taken from the upgrade URL query string.
///
/// `ws://relay:3001/?kasir_id=5&secret=...`
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ConnectParams {
    pub kasir_id: Option<String>,
    pub secret: Option<String>,
}

// Hand-written so the secret never reaches a log line.
impl std::fmt::Debug for ConnectParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectParams")
            .field("kasir_id", &self.kasir_id)
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Result of a completed registration.
#[derive(Debug)]
pub struct Registration {
    /// The newly registered session.
    pub session: SessionHandle,
    /// The session that previously held this identity, already told to close.
    pub superseded: Option<SessionHandle>,
}

/// Pre-registration half of the lifecycle for one connection.
#[derive(Debug)]
pub struct Handshake {
    state: SessionState,
    params: ConnectParams,
}

impl Default for Handshake {
    fn default() -> Self {
        Self::new()
    }
}

impl Handshake {
    pub fn new() -> Self {
        Self {
            state: SessionState::Connecting,
            params: ConnectParams::default(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The transport accepted the connection: `Connecting → Authenticating`.
    pub fn accept(&mut self, params: ConnectParams) {
        self.transition(SessionState::Authenticating);
        self.params = params;
    }

    /// Checks the connection's credentials.
    ///
    /// On rejection the handshake moves to `Closed`; the caller closes the
    /// transport with [`RejectReason::close_code`].
    ///
    /// # Errors
    ///
    /// Returns the [`RejectReason`] reported by the verifier.
    pub fn authenticate(
        &mut self,
        verifier: &CredentialVerifier,
    ) -> Result<TerminalId, RejectReason> {
        debug_assert_eq!(self.state, SessionState::Authenticating);

        let result = verifier.authenticate(
            self.params.kasir_id.as_deref(),
            self.params.secret.as_deref(),
        );
        // The secret is not needed past this point.
        self.params.secret = None;

        if let Err(reason) = &result {
            warn!(
                kasir_id = self.params.kasir_id.as_deref().unwrap_or("<missing>"),
                code = reason.close_code(),
                "connection rejected: {reason}"
            );
            self.transition(SessionState::Closed);
        }
        result
    }

    /// Registers an authenticated terminal: `Authenticating → Registered`.
    ///
    /// A session previously registered under the same identity is terminated
    /// with close code 4000 so its transport does not linger unaddressable.
    /// Its own close path later finds the registry entry taken by the new
    /// session and leaves it alone.
    pub async fn register(
        mut self,
        kasir_id: TerminalId,
        registry: &SessionRegistry,
        outbound: mpsc::UnboundedSender<Outbound>,
    ) -> Registration {
        self.transition(SessionState::Registered);

        let session = Session::new(kasir_id, outbound);
        // Queued before the entry becomes visible so no delivery can overtake it.
        if let Err(e) = session.send(&ServerMessage::welcome(session.kasir_id())) {
            warn!(kasir_id = %session.kasir_id(), "failed to queue welcome: {e}");
        }
        let superseded = registry.register(SessionHandle::clone(&session)).await;

        if let Some(old) = &superseded {
            info!(
                kasir_id = %session.kasir_id(),
                old_session = %old.id(),
                "closing superseded connection"
            );
            old.terminate(close_code::SUPERSEDED, close_code::SUPERSEDED_REASON);
        }

        info!(kasir_id = %session.kasir_id(), session = %session.id(), "Kasir {} connected", session.kasir_id());

        Registration {
            session,
            superseded,
        }
    }

    fn transition(&mut self, next: SessionState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {:?} → {:?}",
            self.state,
            next
        );
        debug!(
            kasir_id = self.params.kasir_id.as_deref().unwrap_or("-"),
            "handshake {} → {}",
            self.state.as_str(),
            next.as_str()
        );
        self.state = next;
    }
}

/// Runs a session's close path: `Closing`, compare-and-remove, `Closed`.
///
/// Safe to call more than once and after [`Session::terminate`]; only the
/// session's own registry entry is ever removed.  Returns whether this call
/// removed the entry.
pub async fn close_session(registry: &SessionRegistry, session: &Session) -> bool {
    session.begin_close();
    let removed = registry
        .remove(session.kasir_id().as_str(), session.id())
        .await;
    session.mark_closed();

    if removed {
        info!(
            kasir_id = %session.kasir_id(),
            session = %session.id(),
            connected_for = ?session.connected_at().elapsed(),
            "Kasir {} disconnected",
            session.kasir_id()
        );
    } else {
        debug!(kasir_id = %session.kasir_id(), session = %session.id(), "session closed after losing its registry entry");
    }
    removed
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::gateway::DeliveryGateway;
    use kasir_core::auth::sha256_digest;
    use std::sync::Arc;

    fn params(kasir_id: Option<&str>, secret: Option<&str>) -> ConnectParams {
        ConnectParams {
            kasir_id: kasir_id.map(str::to_string),
            secret: secret.map(str::to_string),
        }
    }

    fn verifier() -> CredentialVerifier {
        CredentialVerifier::open()
            .with_allow_list(["1", "3", "5"].iter().filter_map(|s| TerminalId::parse(s)))
            .with_secret_digest(sha256_digest("pw"))
    }

    fn authenticated(kasir_id: &str) -> (Handshake, TerminalId) {
        let mut hs = Handshake::new();
        hs.accept(params(Some(kasir_id), Some("pw")));
        let id = hs.authenticate(&verifier()).expect("valid credentials");
        (hs, id)
    }

    #[test]
    fn test_new_handshake_is_connecting() {
        assert_eq!(Handshake::new().state(), SessionState::Connecting);
    }

    #[test]
    fn test_accept_moves_to_authenticating() {
        let mut hs = Handshake::new();
        hs.accept(params(Some("5"), Some("pw")));
        assert_eq!(hs.state(), SessionState::Authenticating);
    }

    #[test]
    fn test_missing_identifier_rejects_with_4001() {
        let mut hs = Handshake::new();
        hs.accept(params(None, Some("pw")));

        let err = hs.authenticate(&verifier()).unwrap_err();

        assert_eq!(err.close_code(), 4001);
        assert_eq!(hs.state(), SessionState::Closed);
    }

    #[test]
    fn test_unlisted_identifier_rejects_with_4003() {
        let mut hs = Handshake::new();
        hs.accept(params(Some("99"), Some("pw")));

        let err = hs.authenticate(&verifier()).unwrap_err();

        assert_eq!(err.close_code(), 4003);
        assert_eq!(hs.state(), SessionState::Closed);
    }

    #[test]
    fn test_bad_secret_rejects_with_4002() {
        let mut hs = Handshake::new();
        hs.accept(params(Some("5"), Some("guess")));

        let err = hs.authenticate(&verifier()).unwrap_err();

        assert_eq!(err.close_code(), 4002);
    }

    #[test]
    fn test_debug_output_redacts_secret() {
        let rendered = format!("{:?}", params(Some("5"), Some("hunter2")));
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }

    #[tokio::test]
    async fn test_register_inserts_session_and_queues_welcome() {
        // Arrange
        let registry = SessionRegistry::new();
        let (hs, id) = authenticated("5");
        let (tx, mut rx) = mpsc::unbounded_channel();

        // Act
        let reg = hs.register(id, &registry, tx).await;

        // Assert
        assert!(reg.superseded.is_none());
        assert_eq!(reg.session.state(), SessionState::Registered);
        assert_eq!(
            registry.lookup("5").await.map(|s| s.id()),
            Some(reg.session.id())
        );
        match rx.try_recv().unwrap() {
            Outbound::Text(text) => {
                let value: serde_json::Value = serde_json::from_str(&text).unwrap();
                assert_eq!(value["type"], "connected");
                assert_eq!(value["kasir_id"], "5");
            }
            other => panic!("expected welcome text, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_welcome_precedes_delivery_made_right_after_registration() {
        // Arrange
        let registry = Arc::new(SessionRegistry::new());
        let gateway = DeliveryGateway::new(Arc::clone(&registry));
        let (hs, id) = authenticated("5");
        let (tx, mut rx) = mpsc::unbounded_channel();

        // Act: deliver as soon as the entry is visible
        hs.register(id, &registry, tx).await;
        gateway.send_qr("5", "QR1", "Pay now").await.unwrap();

        // Assert
        let kinds: Vec<String> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|frame| match frame {
                Outbound::Text(text) => {
                    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
                    value["type"].as_str().unwrap().to_string()
                }
                other => panic!("expected text frame, got {other:?}"),
            })
            .collect();
        assert_eq!(kinds, ["connected", "qr_code"]);
    }

    #[tokio::test]
    async fn test_register_supersedes_and_closes_previous_session() {
        let registry = SessionRegistry::new();

        let (hs1, id1) = authenticated("3");
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let first = hs1.register(id1, &registry, tx1).await.session;
        let _welcome = rx1.try_recv().unwrap();

        let (hs2, id2) = authenticated("3");
        let (tx2, _rx2) = mpsc::unbounded_channel();
        let second = hs2.register(id2, &registry, tx2).await;

        assert_eq!(second.superseded.map(|s| s.id()), Some(first.id()));
        assert_eq!(first.state(), SessionState::Closing);
        assert_eq!(
            rx1.try_recv().unwrap(),
            Outbound::Close {
                code: 4000,
                reason: "superseded by a newer connection"
            }
        );
        assert_eq!(
            registry.lookup("3").await.unwrap().id(),
            second.session.id()
        );
    }

    #[tokio::test]
    async fn test_close_session_releases_entry_and_marks_closed() {
        let registry = SessionRegistry::new();
        let (hs, id) = authenticated("1");
        let (tx, _rx) = mpsc::unbounded_channel();
        let session = hs.register(id, &registry, tx).await.session;

        let removed = close_session(&registry, &session).await;

        assert!(removed);
        assert_eq!(session.state(), SessionState::Closed);
        assert!(registry.lookup("1").await.is_none());
    }

    #[tokio::test]
    async fn test_superseded_close_path_leaves_new_entry() {
        let registry = SessionRegistry::new();
        let (hs1, id1) = authenticated("3");
        let (tx1, _rx1) = mpsc::unbounded_channel();
        let first = hs1.register(id1, &registry, tx1).await.session;
        let (hs2, id2) = authenticated("3");
        let (tx2, _rx2) = mpsc::unbounded_channel();
        let second = hs2.register(id2, &registry, tx2).await.session;

        let removed = close_session(&registry, &first).await;

        assert!(!removed);
        assert!(Arc::ptr_eq(&registry.lookup("3").await.unwrap(), &second));
    }
}
