//! SessionRegistry: the map from terminal identity to its one live session.
//!
//! # Invariants
//!
//! - At most one session per [`TerminalId`].  Registering a second session
//!   for the same identity replaces the first and hands it back to the
//!   caller, which decides what to do with it.
//! - Removal is compare-and-remove: a session only ever removes *its own*
//!   entry.  When an old connection's close path runs after a newer
//!   connection registered, the newer entry survives.
//!
//! # Locking
//!
//! A single `tokio::sync::Mutex` guards the map, so register, lookup,
//! remove, and enumeration are mutually exclusive and never observe a
//! half-applied update.  No transport I/O happens while the lock is held:
//! callers get `Arc` handles out and talk to sessions after the guard drops.

use std::collections::HashMap;

use kasir_core::TerminalId;
use tokio::sync::Mutex;
use tracing::debug;

use crate::application::session::SessionHandle;
use crate::domain::SessionId;

/// Registry of live terminal sessions.
///
/// Constructed once per server and shared as `Arc<SessionRegistry>` by the
/// handshake, the delivery gateway, and the liveness monitor.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<TerminalId, SessionHandle>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `session` under its terminal identity.
    ///
    /// Returns the session it superseded, if any.
    pub async fn register(&self, session: SessionHandle) -> Option<SessionHandle> {
        let kasir_id = session.kasir_id().clone();
        let previous = self.sessions.lock().await.insert(kasir_id, session);
        if let Some(prev) = &previous {
            debug!(kasir_id = %prev.kasir_id(), old_session = %prev.id(), "registry entry superseded");
        }
        previous
    }

    /// Returns the session currently registered for `kasir_id`.
    pub async fn lookup(&self, kasir_id: &str) -> Option<SessionHandle> {
        self.sessions.lock().await.get(kasir_id).cloned()
    }

    /// Removes the entry for `kasir_id` only if it still belongs to
    /// `session_id`.  Returns whether an entry was removed.
    pub async fn remove(&self, kasir_id: &str, session_id: SessionId) -> bool {
        let mut sessions = self.sessions.lock().await;
        match sessions.get(kasir_id) {
            Some(current) if current.id() == session_id => {
                sessions.remove(kasir_id);
                true
            }
            Some(current) => {
                debug!(
                    kasir_id,
                    stale_session = %session_id,
                    current_session = %current.id(),
                    "ignoring removal of superseded session"
                );
                false
            }
            None => false,
        }
    }

    /// Identities whose registered session is open, in unspecified order.
    pub async fn list_connected(&self) -> Vec<TerminalId> {
        self.sessions
            .lock()
            .await
            .values()
            .filter(|s| s.is_open())
            .map(|s| s.kasir_id().clone())
            .collect()
    }

    /// Snapshot of every registered session.
    pub async fn sessions(&self) -> Vec<SessionHandle> {
        self.sessions.lock().await.values().cloned().collect()
    }

    /// Number of registered sessions, open or closing.
    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Removes and returns every session.  Used at shutdown.
    pub async fn drain(&self) -> Vec<SessionHandle> {
        self.sessions
            .lock()
            .await
            .drain()
            .map(|(_, session)| session)
            .collect()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
