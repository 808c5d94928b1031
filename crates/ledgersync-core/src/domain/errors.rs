//! Domain error types
//!
//! This module defines error types specific to domain operations,
//! including validation failures, unknown entity references, and
//! invalid engine state transitions.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid entity identifier
    #[error("Invalid entity id: {0}")]
    InvalidId(String),

    /// Invalid user key (owning principal)
    #[error("Invalid user key: {0}")]
    InvalidUserKey(String),

    /// Generic validation failure at entity construction
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// An update or delete targeted an id that is not in the collection
    #[error("Unknown {resource} id: {id}")]
    UnknownEntity {
        /// The resource kind the mutation targeted
        resource: &'static str,
        /// The id that could not be resolved
        id: String,
    },

    /// A transaction referenced a funding source that does not exist
    #[error("Unknown funding source: {0}")]
    UnknownSource(String),

    /// A budget add would violate the one-budget-per-category invariant
    #[error("Budget already exists for category: {0}")]
    DuplicateBudget(String),

    /// Invalid engine state transition attempt
    #[error("Invalid state transition from {from} to {to}")]
    InvalidState {
        /// The current state
        from: String,
        /// The attempted target state
        to: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DomainError::InvalidId("".to_string());
        assert_eq!(err.to_string(), "Invalid entity id: ");

        let err = DomainError::UnknownEntity {
            resource: "card",
            id: "abc".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown card id: abc");

        let err = DomainError::InvalidState {
            from: "Uninitialized".to_string(),
            to: "Ready".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid state transition from Uninitialized to Ready"
        );
    }

    #[test]
    fn test_error_equality() {
        let err1 = DomainError::DuplicateBudget("food".to_string());
        let err2 = DomainError::DuplicateBudget("food".to_string());
        let err3 = DomainError::DuplicateBudget("travel".to_string());

        assert_eq!(err1, err2);
        assert_ne!(err1, err3);
    }
}
