//! # Errors
//!
//! Failure kinds surfaced by the identity engines. Unexpected lower-level
//! failures are wrapped with the name of the operation that raised them;
//! `NotFound` and `InvalidArgument` are surfaced raw so callers can
//! pattern-match.

use thiserror::Error;

/// Result type for all public operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure kinds for identity, credential and presentation operations.
#[derive(Error, Debug)]
pub enum Error {
    /// A required input is missing, ill-typed, or out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The requested document, verification method, service, or connector
    /// does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A stored document failed vault signature verification.
    #[error("integrity check failed: {0}")]
    Integrity(String),

    /// A JWT signature did not verify against the referenced key.
    #[error("signature verification failed: {0}")]
    Signature(String),

    /// The resolved state cannot support the operation (for example, a
    /// verification method without key material).
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// The vault reported a failure.
    #[error("{operation} failed: vault error: {cause}")]
    Vault {
        /// Operation that raised the failure.
        operation: &'static str,
        /// Underlying vault failure.
        cause: anyhow::Error,
    },

    /// The entity store reported a failure.
    #[error("{operation} failed: storage error: {cause}")]
    Storage {
        /// Operation that raised the failure.
        operation: &'static str,
        /// Underlying store failure.
        cause: anyhow::Error,
    },

    /// Malformed base64, hex, gzip, UTF-8, or JSON input.
    #[error("encoding error: {0}")]
    Encoding(String),
}

impl Error {
    /// Wrap a vault failure with the name of the operation that raised it.
    #[must_use]
    pub fn vault(operation: &'static str, cause: anyhow::Error) -> Self {
        Self::Vault { operation, cause }
    }

    /// Wrap an entity-store failure with the name of the operation that
    /// raised it.
    #[must_use]
    pub fn storage(operation: &'static str, cause: anyhow::Error) -> Self {
        Self::Storage { operation, cause }
    }

    /// `true` when the error is `NotFound`.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Encoding(format!("issue serializing/deserializing JSON: {e}"))
    }
}
