//! Resource service port (driven/secondary port)
//!
//! This module defines the interface to the remote REST resource service
//! that owns the authoritative copy of a user's four entity collections.
//! The primary implementation lives in `ledgersync-api` (reqwest), but
//! the trait is transport-agnostic so engine tests can substitute an
//! in-memory fake.
//!
//! ## Design Notes
//!
//! - Unlike the storage ports, this port returns a typed [`ServiceError`]:
//!   the reconciliation engine's durability routing depends on *why* a
//!   remote call failed (connectivity and auth failures degrade into the
//!   offline queue; rejections do not), and that classification is only
//!   reliable at the adapter boundary where the transport error and HTTP
//!   status still exist.
//! - All requests are implicitly scoped to the bearer's identity; the
//!   trait therefore carries no user parameter.

use thiserror::Error;

use crate::domain::{
    Account, AccountPatch, Budget, BudgetPatch, Card, CardPatch, EntityId, Transaction,
    TransactionPatch,
};

// ============================================================================
// ServiceError
// ============================================================================

/// Classified failure of a remote service call
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Network-level failure (DNS, connect, timeout, abort). Recoverable:
    /// the engine silently falls back to the offline durability path.
    #[error("connectivity failure: {0}")]
    Connectivity(String),

    /// Missing, expired, or rejected credential (401/403). Queued for
    /// durability like a connectivity failure, but additionally surfaced
    /// so the session can re-authenticate.
    #[error("authentication failure: {0}")]
    Auth(String),

    /// The targeted entity does not exist on the server (404).
    /// Non-recoverable for that single mutation.
    #[error("not found: {0}")]
    NotFound(String),

    /// The server answered with a non-success status other than the
    /// auth/not-found classes.
    #[error("remote rejected request (status {status}): {message}")]
    Rejected {
        /// HTTP status code of the response
        status: u16,
        /// Response body or reason phrase
        message: String,
    },

    /// Anything else (malformed response body, invalid server id, ...)
    #[error("unexpected service failure: {0}")]
    Unexpected(String),
}

impl ServiceError {
    /// Returns true if the failed mutation should be queued for replay
    ///
    /// Connectivity and auth failures are transient with respect to the
    /// mutation itself; rejections and not-found answers are verdicts on
    /// the mutation and replaying them verbatim cannot succeed.
    pub fn is_queueable(&self) -> bool {
        matches!(self, ServiceError::Connectivity(_) | ServiceError::Auth(_))
    }

    /// Returns true for authentication failures
    pub fn is_auth(&self) -> bool {
        matches!(self, ServiceError::Auth(_))
    }
}

// ============================================================================
// IResourceService trait
// ============================================================================

/// Port trait for the remote REST resource service
///
/// Four resources (cards, accounts, transactions, budgets), each with
/// list / create / update / delete, plus a health probe used by the
/// startup protocol. Create calls return the created entity as the
/// server stored it — including the authoritative id and timestamps —
/// which the engine uses to reconcile provisional ids.
#[async_trait::async_trait]
pub trait IResourceService: Send + Sync {
    /// Probes the service (bounded timeout); used by the startup protocol
    async fn health_check(&self) -> Result<(), ServiceError>;

    // --- Cards ---

    /// Lists all cards owned by the bearer
    async fn list_cards(&self) -> Result<Vec<Card>, ServiceError>;

    /// Creates a card; returns the server's copy with its assigned id
    async fn create_card(&self, card: &Card) -> Result<Card, ServiceError>;

    /// Partially updates a card by id
    async fn update_card(&self, id: &EntityId, updates: &CardPatch) -> Result<(), ServiceError>;

    /// Deletes a card by id
    async fn delete_card(&self, id: &EntityId) -> Result<(), ServiceError>;

    // --- Accounts ---

    /// Lists all accounts owned by the bearer
    async fn list_accounts(&self) -> Result<Vec<Account>, ServiceError>;

    /// Creates an account; returns the server's copy with its assigned id
    async fn create_account(&self, account: &Account) -> Result<Account, ServiceError>;

    /// Partially updates an account by id
    async fn update_account(
        &self,
        id: &EntityId,
        updates: &AccountPatch,
    ) -> Result<(), ServiceError>;

    /// Deletes an account by id
    async fn delete_account(&self, id: &EntityId) -> Result<(), ServiceError>;

    // --- Transactions ---

    /// Lists all transactions owned by the bearer
    async fn list_transactions(&self) -> Result<Vec<Transaction>, ServiceError>;

    /// Creates a transaction; returns the server's copy with its assigned id
    async fn create_transaction(&self, tx: &Transaction) -> Result<Transaction, ServiceError>;

    /// Partially updates a transaction by id
    async fn update_transaction(
        &self,
        id: &EntityId,
        updates: &TransactionPatch,
    ) -> Result<(), ServiceError>;

    /// Deletes a transaction by id
    async fn delete_transaction(&self, id: &EntityId) -> Result<(), ServiceError>;

    // --- Budgets ---

    /// Lists all budgets owned by the bearer
    async fn list_budgets(&self) -> Result<Vec<Budget>, ServiceError>;

    /// Creates a budget; returns the server's copy with its assigned id
    async fn create_budget(&self, budget: &Budget) -> Result<Budget, ServiceError>;

    /// Partially updates a budget by id
    async fn update_budget(
        &self,
        id: &EntityId,
        updates: &BudgetPatch,
    ) -> Result<(), ServiceError>;

    /// Deletes a budget by id
    async fn delete_budget(&self, id: &EntityId) -> Result<(), ServiceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queueable_classification() {
        assert!(ServiceError::Connectivity("timeout".into()).is_queueable());
        assert!(ServiceError::Auth("expired".into()).is_queueable());
        assert!(!ServiceError::NotFound("card c-1".into()).is_queueable());
        assert!(!ServiceError::Rejected {
            status: 422,
            message: "invalid".into()
        }
        .is_queueable());
        assert!(!ServiceError::Unexpected("bad json".into()).is_queueable());
    }

    #[test]
    fn test_auth_classification() {
        assert!(ServiceError::Auth("missing token".into()).is_auth());
        assert!(!ServiceError::Connectivity("dns".into()).is_auth());
    }

    #[test]
    fn test_display() {
        let err = ServiceError::Rejected {
            status: 500,
            message: "boom".into(),
        };
        assert_eq!(err.to_string(), "remote rejected request (status 500): boom");
    }
}
