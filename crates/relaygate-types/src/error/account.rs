//! Account-related errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during account operations.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum AccountError {
    /// Account with given ID not found
    #[error("Account not found: {id}")]
    NotFound {
        /// Unique identifier of the missing account
        id: String,
    },

    /// Account is not in the state an operation requires
    #[error("Account {id} is {actual}, expected {expected}")]
    UnexpectedStatus {
        /// Unique identifier of the account
        id: String,
        /// Status the operation required
        expected: String,
        /// Status the account actually has
        actual: String,
    },

    /// Account storage error
    #[error("Account storage error: {message}")]
    StorageError {
        /// Description of the storage failure
        message: String,
    },

    /// Account pool exhausted (every candidate is on hold or inactive)
    #[error("Account pool exhausted: {reason}")]
    PoolExhausted {
        /// Operator-facing explanation of why no accounts are available
        reason: String,
    },
}

impl AccountError {
    /// Check if this is a temporary error that may resolve on retry.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::PoolExhausted { .. } | Self::StorageError { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_transient() {
        let transient = AccountError::PoolExhausted { reason: "all rate limited".to_string() };
        let permanent = AccountError::NotFound { id: "x".to_string() };

        assert!(transient.is_transient());
        assert!(!permanent.is_transient());
    }

    #[test]
    fn test_unexpected_status_display() {
        let err = AccountError::UnexpectedStatus {
            id: "acc-1".to_string(),
            expected: "error".to_string(),
            actual: "active".to_string(),
        };
        assert_eq!(err.to_string(), "Account acc-1 is active, expected error");
    }
}
