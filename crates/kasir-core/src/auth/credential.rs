//! Terminal credential verification.
//!
//! A terminal proves its identity at connection time with two values taken
//! from the upgrade URL: its `kasir_id` and a shared `secret`.  The verifier
//! checks the identifier against an allow-list and the secret against a
//! stored SHA-256 digest.  The clear-text secret is never stored; the only
//! comparison ever made is digest against digest, in constant time.
//!
//! Both checks are optional.  A verifier with no allow-list accepts every
//! non-empty identifier, and one with no digest skips the secret check, so a
//! default [`CredentialVerifier`] behaves like an unauthenticated relay.

use std::collections::HashSet;

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::domain::TerminalId;
use crate::protocol::close_code;

/// Length in bytes of a SHA-256 digest.
pub const DIGEST_LEN: usize = 32;

/// A SHA-256 digest of a terminal secret.
pub type SecretDigest = [u8; DIGEST_LEN];

/// Errors raised while building a verifier from configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialError {
    /// The configured digest is not valid hexadecimal.
    #[error("secret digest is not valid hex: {0}")]
    InvalidHex(String),

    /// The configured digest decodes to the wrong number of bytes.
    #[error("secret digest must be {DIGEST_LEN} bytes, got {0}")]
    WrongLength(usize),
}

/// Why a handshake was rejected.
///
/// Each reason maps to a distinct WebSocket close code so a terminal can tell
/// a configuration mistake on its side from a credential problem.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq, Hash)]
pub enum RejectReason {
    /// The connection URL carried no `kasir_id`, or an empty one.
    #[error("kasir_id is required")]
    MissingIdentifier,

    /// The identifier is not on the configured allow-list.
    #[error("kasir_id is not allowed")]
    IdentifierNotAllowed,

    /// The secret was absent or its digest did not match.
    #[error("invalid secret")]
    InvalidSecret,
}

impl RejectReason {
    /// WebSocket close code sent to the terminal for this rejection.
    pub fn close_code(self) -> u16 {
        match self {
            RejectReason::MissingIdentifier => close_code::MISSING_IDENTIFIER,
            RejectReason::IdentifierNotAllowed => close_code::IDENTIFIER_NOT_ALLOWED,
            RejectReason::InvalidSecret => close_code::INVALID_SECRET,
        }
    }
}

/// Checks terminal identifiers and secrets presented at connection time.
///
/// The verifier is immutable after construction and has no side effects, so
/// it is shared between connection tasks behind an `Arc` without locking.
#[derive(Debug, Clone, Default)]
pub struct CredentialVerifier {
    allowed: Option<HashSet<TerminalId>>,
    secret_digest: Option<SecretDigest>,
}

impl CredentialVerifier {
    /// Returns a verifier that accepts any non-empty identifier without a secret.
    pub fn open() -> Self {
        Self::default()
    }

    /// Restricts accepted identifiers to `ids`.
    pub fn with_allow_list<I>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = TerminalId>,
    {
        self.allowed = Some(ids.into_iter().collect());
        self
    }

    /// Requires a secret whose SHA-256 digest equals `digest`.
    pub fn with_secret_digest(mut self, digest: SecretDigest) -> Self {
        self.secret_digest = Some(digest);
        self
    }

    /// Like [`with_secret_digest`](Self::with_secret_digest), but takes the
    /// digest as a hex string (the form it is configured in).
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError`] if `digest_hex` is not 64 hex characters.
    pub fn with_secret_digest_hex(self, digest_hex: &str) -> Result<Self, CredentialError> {
        let digest = parse_digest_hex(digest_hex)?;
        Ok(self.with_secret_digest(digest))
    }

    /// Whether an allow-list is configured.
    pub fn has_allow_list(&self) -> bool {
        self.allowed.is_some()
    }

    /// Whether connecting terminals must present a secret.
    pub fn requires_secret(&self) -> bool {
        self.secret_digest.is_some()
    }

    /// Whether `identifier` passes the allow-list (always true without one).
    pub fn is_allowed(&self, identifier: &str) -> bool {
        match &self.allowed {
            Some(allowed) => allowed.contains(identifier),
            None => true,
        }
    }

    /// Returns `true` only when the identifier and secret are both acceptable.
    ///
    /// Never panics; every failure is reported as `false`.
    pub fn verify(&self, identifier: Option<&str>, secret: Option<&str>) -> bool {
        self.authenticate(identifier, secret).is_ok()
    }

    /// Validates a connection's credentials and returns the terminal identity.
    ///
    /// Checks run in a fixed order so the rejection reason is deterministic:
    /// a missing identifier wins over an unknown one, and an unknown
    /// identifier is rejected before its secret is looked at.
    ///
    /// # Errors
    ///
    /// Returns the [`RejectReason`] of the first failing check.
    pub fn authenticate(
        &self,
        identifier: Option<&str>,
        secret: Option<&str>,
    ) -> Result<TerminalId, RejectReason> {
        let terminal = identifier
            .and_then(TerminalId::parse)
            .ok_or(RejectReason::MissingIdentifier)?;

        if !self.is_allowed(terminal.as_str()) {
            return Err(RejectReason::IdentifierNotAllowed);
        }

        if let Some(expected) = &self.secret_digest {
            let secret = secret.ok_or(RejectReason::InvalidSecret)?;
            let presented = sha256_digest(secret);
            if !bool::from(presented[..].ct_eq(&expected[..])) {
                return Err(RejectReason::InvalidSecret);
            }
        }

        Ok(terminal)
    }
}

/// Computes the SHA-256 digest of a secret.
pub fn sha256_digest(secret: &str) -> SecretDigest {
    Sha256::digest(secret.as_bytes()).into()
}

/// Parses a hex-encoded SHA-256 digest (case-insensitive).
///
/// # Errors
///
/// Returns [`CredentialError::InvalidHex`] for non-hex input and
/// [`CredentialError::WrongLength`] if it does not decode to 32 bytes.
pub fn parse_digest_hex(digest_hex: &str) -> Result<SecretDigest, CredentialError> {
    let bytes = hex::decode(digest_hex.trim())
        .map_err(|e| CredentialError::InvalidHex(e.to_string()))?;
    let len = bytes.len();
    bytes
        .try_into()
        .map_err(|_| CredentialError::WrongLength(len))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[&str]) -> Vec<TerminalId> {
        raw.iter().filter_map(|s| TerminalId::parse(s)).collect()
    }

    fn locked_verifier() -> CredentialVerifier {
        CredentialVerifier::open()
            .with_allow_list(ids(&["1", "2", "3", "5"]))
            .with_secret_digest(sha256_digest("s3cret"))
    }

    #[test]
    fn test_authenticate_accepts_allowed_id_with_correct_secret() {
        let verifier = locked_verifier();

        let result = verifier.authenticate(Some("5"), Some("s3cret"));

        assert_eq!(result, Ok(TerminalId::parse("5").unwrap()));
    }

    #[test]
    fn test_authenticate_rejects_missing_identifier() {
        let verifier = locked_verifier();
        assert_eq!(
            verifier.authenticate(None, Some("s3cret")),
            Err(RejectReason::MissingIdentifier)
        );
    }

    #[test]
    fn test_authenticate_treats_empty_identifier_as_missing() {
        let verifier = CredentialVerifier::open();
        assert_eq!(
            verifier.authenticate(Some(""), None),
            Err(RejectReason::MissingIdentifier)
        );
    }

    #[test]
    fn test_authenticate_rejects_unknown_identifier_even_with_correct_secret() {
        let verifier = locked_verifier();

        for secret in [Some("s3cret"), Some("wrong"), None] {
            assert_eq!(
                verifier.authenticate(Some("99"), secret),
                Err(RejectReason::IdentifierNotAllowed),
                "secret {secret:?} must not change the outcome"
            );
        }
    }

    #[test]
    fn test_authenticate_rejects_wrong_secret() {
        let verifier = locked_verifier();
        assert_eq!(
            verifier.authenticate(Some("3"), Some("guess")),
            Err(RejectReason::InvalidSecret)
        );
    }

    #[test]
    fn test_authenticate_rejects_absent_secret_when_digest_configured() {
        let verifier = locked_verifier();
        assert_eq!(
            verifier.authenticate(Some("3"), None),
            Err(RejectReason::InvalidSecret)
        );
    }

    #[test]
    fn test_open_verifier_accepts_any_identifier_without_secret() {
        let verifier = CredentialVerifier::open();

        assert!(verifier.verify(Some("anything"), None));
        assert!(!verifier.has_allow_list());
        assert!(!verifier.requires_secret());
    }

    #[test]
    fn test_verify_mirrors_authenticate() {
        let verifier = locked_verifier();

        assert!(verifier.verify(Some("1"), Some("s3cret")));
        assert!(!verifier.verify(Some("1"), Some("nope")));
        assert!(!verifier.verify(None, Some("s3cret")));
        assert!(!verifier.verify(Some("4"), Some("s3cret")));
    }

    #[test]
    fn test_secret_only_verifier_allows_any_identifier() {
        let verifier = CredentialVerifier::open().with_secret_digest(sha256_digest("k"));

        assert!(verifier.verify(Some("42"), Some("k")));
        assert!(!verifier.verify(Some("42"), Some("K")));
    }

    #[test]
    fn test_reject_reason_close_codes_are_distinct() {
        assert_eq!(RejectReason::MissingIdentifier.close_code(), 4001);
        assert_eq!(RejectReason::InvalidSecret.close_code(), 4002);
        assert_eq!(RejectReason::IdentifierNotAllowed.close_code(), 4003);
    }

    #[test]
    fn test_sha256_digest_matches_known_vector() {
        // SHA-256("abc") from FIPS 180-2.
        let expected = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";
        assert_eq!(hex::encode(sha256_digest("abc")), expected);
    }

    #[test]
    fn test_parse_digest_hex_accepts_uppercase() {
        let lower = hex::encode(sha256_digest("abc"));
        let upper = lower.to_uppercase();
        assert_eq!(parse_digest_hex(&upper), parse_digest_hex(&lower));
        assert!(parse_digest_hex(&upper).is_ok());
    }

    #[test]
    fn test_parse_digest_hex_rejects_non_hex() {
        assert!(matches!(
            parse_digest_hex("zz"),
            Err(CredentialError::InvalidHex(_))
        ));
    }

    #[test]
    fn test_parse_digest_hex_rejects_short_digest() {
        assert_eq!(parse_digest_hex("abcd"), Err(CredentialError::WrongLength(2)));
    }

    #[test]
    fn test_with_secret_digest_hex_round_trips_configured_secret() {
        let hex_digest = hex::encode(sha256_digest("pos-secret"));
        let verifier = CredentialVerifier::open()
            .with_secret_digest_hex(&hex_digest)
            .expect("valid digest");

        assert!(verifier.verify(Some("1"), Some("pos-secret")));
    }
}
