//! Terminal (kasir) identity.
//!
//! A [`TerminalId`] is the routing key of the relay: the backend addresses a
//! notification to a terminal by this string, and the session registry maps it
//! to at most one live connection.  The identifier is opaque; the relay never
//! interprets its contents beyond "non-empty".

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable identifier of a point-of-sale terminal.
///
/// Constructed with [`TerminalId::parse`], which rejects empty strings, so a
/// `TerminalId` value is always a usable routing key.
///
/// # Example
///
/// ```rust
/// use kasir_core::TerminalId;
///
/// let id = TerminalId::parse("5").unwrap();
/// assert_eq!(id.as_str(), "5");
/// assert!(TerminalId::parse("").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TerminalId(String);

impl TerminalId {
    /// Parses a raw identifier, returning `None` when it is empty.
    ///
    /// Surrounding whitespace is kept as-is: identifiers are opaque and the
    /// allow-list comparison is exact.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.is_empty() {
            None
        } else {
            Some(Self(raw.to_string()))
        }
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TerminalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for TerminalId {
    type Error = EmptyTerminalId;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        if raw.is_empty() {
            Err(EmptyTerminalId)
        } else {
            Ok(Self(raw))
        }
    }
}

impl From<TerminalId> for String {
    fn from(id: TerminalId) -> Self {
        id.0
    }
}

/// A terminal identifier was empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("kasir_id must not be empty")]
pub struct EmptyTerminalId;

// Lets `HashMap<TerminalId, _>` and `HashSet<TerminalId>` be queried with a
// plain `&str` without allocating.
impl Borrow<str> for TerminalId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
