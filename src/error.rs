//! Error taxonomy for submissions.
//!
//! The split that matters is terminal versus transient: terminal outcomes
//! remove a queued entry permanently, transient ones halt the drain and
//! leave the queue untouched for the next trigger.

use thiserror::Error;

/// Failure modes of a commit attempt, local or remote.
#[derive(Debug, Error)]
pub enum CommitError {
    /// Payload rejected by validation. Terminal: never retried.
    #[error("validation failed on '{field}': {message}")]
    Validation { field: String, message: String },

    /// Caller is not allowed to perform the operation. Terminal.
    #[error("not authorized: {0}")]
    Authorization(String),

    /// No response from the server (unreachable, timed out). Transient;
    /// a timeout is never proof the server did not commit, so retrying
    /// under the same idempotency key is always safe.
    #[error("network unreachable: {0}")]
    Network(String),

    /// Server-side failure (5xx, storage error). Transient.
    #[error("server error: {0}")]
    Server(String),
}

impl CommitError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        CommitError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Transient failures halt a drain; terminal ones drop the entry.
    pub fn is_transient(&self) -> bool {
        matches!(self, CommitError::Network(_) | CommitError::Server(_))
    }
}

impl From<sqlx::Error> for CommitError {
    fn from(err: sqlx::Error) -> Self {
        CommitError::Server(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(CommitError::Network("down".into()).is_transient());
        assert!(CommitError::Server("boom".into()).is_transient());
        assert!(!CommitError::validation("amount", "must be positive").is_transient());
        assert!(!CommitError::Authorization("nope".into()).is_transient());
    }
}
