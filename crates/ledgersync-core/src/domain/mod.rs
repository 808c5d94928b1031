//! Domain entities and business logic
//!
//! This module contains the core domain types for LedgerSync:
//! - Newtypes for type-safe identifiers (user key, tagged entity id)
//! - The four synchronized entities: cards, accounts, transactions, budgets
//! - Mutation types (resource × action × payload)
//! - The in-memory collections and their durable snapshot form
//! - Balance derivation for transaction side effects
//! - The reconciliation engine's state machine
//! - Domain-specific error types

pub mod account;
pub mod balance;
pub mod budget;
pub mod card;
pub mod errors;
pub mod mutation;
pub mod newtypes;
pub mod snapshot;
pub mod state;
pub mod transaction;

// Re-export commonly used types
pub use account::{Account, AccountKind, AccountPatch};
pub use budget::{Budget, BudgetPatch};
pub use card::{Card, CardKind, CardPatch};
pub use errors::DomainError;
pub use mutation::{ActionKind, Mutation, ResourceKind};
pub use newtypes::{EntityId, UserKey};
pub use snapshot::{Collections, FundingSource, Snapshot};
pub use state::{Activity, Connectivity, EngineState};
pub use transaction::{Direction, SourceKind, Transaction, TransactionPatch};
