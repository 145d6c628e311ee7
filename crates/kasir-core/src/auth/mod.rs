//! Terminal authentication.

pub mod credential;

pub use credential::{
    parse_digest_hex, sha256_digest, CredentialError, CredentialVerifier, RejectReason,
    SecretDigest,
};
