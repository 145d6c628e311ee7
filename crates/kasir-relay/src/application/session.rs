//! A registered terminal session and its outbound command channel.
//!
//! The transport (the WebSocket sink) is never shared.  It is owned by one
//! writer task per connection, and every other component reaches it only by
//! queueing an [`Outbound`] command on the session's channel.  The writer
//! drains the channel in order, which serializes all writes to one socket
//! without a lock around the socket itself.
//!
//! ```text
//! gateway ─┐
//! monitor ─┼─► Session::outbound (mpsc) ─► writer task ─► WebSocket sink
//! handshake┘
//! ```

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Instant;

use kasir_core::protocol::encode_server_message;
use kasir_core::{ProtocolError, ServerMessage, TerminalId};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use crate::domain::{SessionId, SessionState};

/// A command for the writer task that owns a session's transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Write one text frame.
    Text(String),
    /// Write a liveness probe (WebSocket ping).
    Ping,
    /// Write a close frame and release the transport.
    Close { code: u16, reason: &'static str },
}

/// Failure to hand a message to a session's writer.
#[derive(Debug, Error)]
pub enum SendError {
    /// The session has left the `Registered` state.
    #[error("session is {0}")]
    NotOpen(&'static str),

    /// The writer task has exited, so the transport is gone.
    #[error("transport writer has exited")]
    WriterGone,

    /// The message could not be serialized.
    #[error(transparent)]
    Encode(#[from] ProtocolError),
}

/// Shared handle to a live session.
pub type SessionHandle = Arc<Session>;

/// One authenticated terminal connection.
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    kasir_id: TerminalId,
    outbound: mpsc::UnboundedSender<Outbound>,
    /// "Responded to the most recent probe."  Starts `true`.
    alive: AtomicBool,
    state: AtomicU8,
    connected_at: Instant,
}

impl Session {
    /// Creates a session in the `Registered` state.
    ///
    /// Only the handshake calls this, right before inserting the session into
    /// the registry, so a `Session` value never exists in a pre-registration
    /// state.
    pub fn new(kasir_id: TerminalId, outbound: mpsc::UnboundedSender<Outbound>) -> SessionHandle {
        Arc::new(Self {
            id: Uuid::new_v4(),
            kasir_id,
            outbound,
            alive: AtomicBool::new(true),
            state: AtomicU8::new(SessionState::Registered as u8),
            connected_at: Instant::now(),
        })
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn kasir_id(&self) -> &TerminalId {
        &self.kasir_id
    }

    pub fn connected_at(&self) -> Instant {
        self.connected_at
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        // Only valid discriminants are ever stored.
        SessionState::try_from(self.state.load(Ordering::Acquire)).unwrap_or(SessionState::Closed)
    }

    /// Whether the session is registered and routable.
    pub fn is_open(&self) -> bool {
        self.state().is_open()
    }

    /// Serializes `msg` and queues it for the writer.
    ///
    /// # Errors
    ///
    /// Returns [`SendError`] if the session is not open, the message cannot
    /// be encoded, or the writer has exited.
    pub fn send(&self, msg: &ServerMessage) -> Result<(), SendError> {
        let state = self.state();
        if !state.is_open() {
            return Err(SendError::NotOpen(state.as_str()));
        }
        let text = encode_server_message(msg)?;
        self.outbound
            .send(Outbound::Text(text))
            .map_err(|_| SendError::WriterGone)
    }

    /// Records a probe acknowledgment (WebSocket pong).
    pub fn mark_alive(&self) {
        self.alive.store(true, Ordering::Release);
    }

    /// Clears the liveness flag and returns whether it was set.
    ///
    /// The liveness monitor calls this once per tick: `false` means the
    /// session never answered the previous probe.
    pub fn take_alive(&self) -> bool {
        self.alive.swap(false, Ordering::AcqRel)
    }

    /// Queues a liveness probe.  Returns `false` if the writer has exited.
    pub fn probe(&self) -> bool {
        self.outbound.send(Outbound::Ping).is_ok()
    }

    /// Moves `Registered → Closing`.
    ///
    /// Returns `true` for exactly one caller; every later call, and any call
    /// on a session that is already closing, returns `false`.
    pub fn begin_close(&self) -> bool {
        let won = self
            .state
            .compare_exchange(
                SessionState::Registered as u8,
                SessionState::Closing as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok();
        if won {
            debug!(kasir_id = %self.kasir_id, session = %self.id, "session registered → closing");
        }
        won
    }

    /// Moves the session to the terminal `Closed` state.
    pub fn mark_closed(&self) {
        let previous = self.state.swap(SessionState::Closed as u8, Ordering::AcqRel);
        if previous != SessionState::Closed as u8 {
            debug!(kasir_id = %self.kasir_id, session = %self.id, "session → closed");
        }
    }

    /// Starts closing the session and asks the writer to send a close frame.
    ///
    /// Returns `false` if the session was already closing, in which case no
    /// second close frame is queued.
    pub fn terminate(&self, code: u16, reason: &'static str) -> bool {
        if !self.begin_close() {
            return false;
        }
        // A closed channel means the transport is already gone.
        let _ = self.outbound.send(Outbound::Close { code, reason });
        true
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
