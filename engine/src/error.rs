//! Error types surfaced by document sources.

use thiserror::Error;

/// A failure reported by a document source.
///
/// "Not found" is deliberately absent: a missing document resolves to
/// `Ok(None)` and an empty collection to `Ok(vec![])`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("unavailable: {0}")]
    Unavailable(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Short machine-readable code for the failure kind.
    pub fn code(&self) -> &'static str {
        match self {
            Error::PermissionDenied(_) => "permission-denied",
            Error::Unavailable(_) => "unavailable",
            Error::InvalidArgument(_) => "invalid-argument",
            Error::Internal(_) => "internal",
        }
    }
}

/// Result type for source operations.
pub type Result<T> = std::result::Result<T, Error>;
