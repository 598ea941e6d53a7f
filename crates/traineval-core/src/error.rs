//! Error types shared by the engine and the store backends.
//!
//! `StoreError` lives here rather than in `traineval-store` so that the
//! engine can propagate persistence failures without depending on a backend.

use thiserror::Error;
use uuid::Uuid;

/// Errors raised by a [`RecordStore`](crate::traits::RecordStore) backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend answered with an error status.
    #[error("store API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The backend could not be reached.
    #[error("network error: {0}")]
    Network(String),

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A row could not be decoded or encoded.
    #[error("failed to decode record: {0}")]
    Decode(String),

    /// Local file access failed.
    #[error("io error: {0}")]
    Io(String),

    /// A uniqueness constraint rejected the write.
    #[error("conflicting record: {0}")]
    Conflict(String),

    /// The backend refused the operation for a reason of its own.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Decode(err.to_string())
    }
}

/// Errors surfaced by leaderboard and report computations.
#[derive(Debug, Error)]
pub enum ScoringError {
    /// A participant or training the caller asked for does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: Uuid },

    /// A read or write against the record store failed.
    #[error("persistence failure: {0}")]
    Store(#[from] StoreError),
}

impl ScoringError {
    pub fn not_found(kind: &'static str, id: Uuid) -> Self {
        ScoringError::NotFound { kind, id }
    }

    /// Returns `true` for missing participant/training data.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ScoringError::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, ScoringError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_wraps_into_scoring_error() {
        let err: ScoringError = StoreError::Network("connection refused".into()).into();
        assert!(!err.is_not_found());
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn not_found_message_names_the_kind() {
        let err = ScoringError::not_found("participant", Uuid::nil());
        assert!(err.is_not_found());
        assert!(err.to_string().starts_with("participant not found"));
    }
}
