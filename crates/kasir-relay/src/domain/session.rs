//! Session identity and lifecycle states.
//!
//! # Lifecycle
//!
//! ```text
//! Connecting ──► Authenticating ──► Registered ──► Closing ──► Closed
//!                      │                                         ▲
//!                      └──────────── rejected (4001/4002/4003) ──┘
//! ```
//!
//! - `Connecting`: the WebSocket upgrade has not completed yet.
//! - `Authenticating`: the upgrade completed; `kasir_id` and `secret` are
//!   being checked.
//! - `Registered`: the session is in the registry and routable.
//! - `Closing`: the transport closed, failed, or missed two liveness probes;
//!   the registry entry is being released.
//! - `Closed`: terminal state, reachable from every other state.

use uuid::Uuid;

/// Unique identifier of one transport session.
///
/// Two connections for the same terminal always have different session ids,
/// which is what lets the registry tell a stale removal from a current one.
pub type SessionId = Uuid;

/// Lifecycle state of a terminal session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SessionState {
    Connecting = 0,
    Authenticating = 1,
    Registered = 2,
    Closing = 3,
    Closed = 4,
}

impl SessionState {
    /// Whether `self → next` is an edge of the lifecycle graph.
    pub fn can_transition_to(self, next: SessionState) -> bool {
        use SessionState::*;
        match (self, next) {
            (Connecting, Authenticating)
            | (Authenticating, Registered)
            | (Registered, Closing) => true,
            (Closed, _) => false,
            (_, Closed) => true,
            _ => false,
        }
    }

    /// Whether a session in this state can receive notifications.
    pub fn is_open(self) -> bool {
        self == SessionState::Registered
    }

    /// Short lowercase name for log lines.
    pub fn as_str(self) -> &'static str {
        match self {
            SessionState::Connecting => "connecting",
            SessionState::Authenticating => "authenticating",
            SessionState::Registered => "registered",
            SessionState::Closing => "closing",
            SessionState::Closed => "closed",
        }
    }
}

impl TryFrom<u8> for SessionState {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(SessionState::Connecting),
            1 => Ok(SessionState::Authenticating),
            2 => Ok(SessionState::Registered),
            3 => Ok(SessionState::Closing),
            4 => Ok(SessionState::Closed),
            other => Err(other),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [SessionState; 5] = [
        SessionState::Connecting,
        SessionState::Authenticating,
        SessionState::Registered,
        SessionState::Closing,
        SessionState::Closed,
    ];

    #[test]
    fn test_happy_path_edges_are_allowed() {
        assert!(SessionState::Connecting.can_transition_to(SessionState::Authenticating));
        assert!(SessionState::Authenticating.can_transition_to(SessionState::Registered));
        assert!(SessionState::Registered.can_transition_to(SessionState::Closing));
        assert!(SessionState::Closing.can_transition_to(SessionState::Closed));
    }

    #[test]
    fn test_every_non_terminal_state_can_close() {
        for state in ALL.into_iter().filter(|s| *s != SessionState::Closed) {
            assert!(state.can_transition_to(SessionState::Closed), "{state:?}");
        }
    }

    #[test]
    fn test_closed_is_terminal() {
        for next in ALL {
            assert!(!SessionState::Closed.can_transition_to(next), "{next:?}");
        }
    }

    #[test]
    fn test_skipping_authentication_is_rejected() {
        assert!(!SessionState::Connecting.can_transition_to(SessionState::Registered));
        assert!(!SessionState::Closing.can_transition_to(SessionState::Registered));
    }

    #[test]
    fn test_only_registered_is_open() {
        for state in ALL {
            assert_eq!(state.is_open(), state == SessionState::Registered);
        }
    }

    #[test]
    fn test_u8_conversion_round_trips_and_rejects_unknown() {
        for state in ALL {
            assert_eq!(SessionState::try_from(state as u8), Ok(state));
        }
        assert_eq!(SessionState::try_from(9), Err(9));
    }
}
