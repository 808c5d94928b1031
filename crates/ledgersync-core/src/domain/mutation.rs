//! Mutation types
//!
//! A [`Mutation`] is a single intended change (add/update/delete) to one
//! entity of one resource kind. Mutations are applied optimistically to
//! the in-memory collections, pushed to the remote service when online,
//! and queued verbatim in the durable mutation queue when offline.
//!
//! The serialized form is tagged with a `kind` discriminator
//! (`ADD_CARD`, `UPDATE_TRANSACTION`, ...) so queued records remain
//! self-describing and greppable in storage.

use serde::{Deserialize, Serialize};

use super::account::{Account, AccountPatch};
use super::budget::{Budget, BudgetPatch};
use super::card::{Card, CardPatch};
use super::newtypes::EntityId;
use super::transaction::{Transaction, TransactionPatch};

/// The four synchronized resource kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Card,
    Account,
    Transaction,
    Budget,
}

impl ResourceKind {
    /// Lower-case name used in errors and log fields
    pub fn name(&self) -> &'static str {
        match self {
            ResourceKind::Card => "card",
            ResourceKind::Account => "account",
            ResourceKind::Transaction => "transaction",
            ResourceKind::Budget => "budget",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The three mutation actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Add,
    Update,
    Delete,
}

/// A single intended change to one entity
///
/// Adds carry the whole optimistic entity (including its provisional id);
/// updates carry the target id plus a sparse patch; deletes carry only
/// the target id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mutation {
    AddCard(Card),
    UpdateCard { id: EntityId, updates: CardPatch },
    DeleteCard { id: EntityId },
    AddAccount(Account),
    UpdateAccount { id: EntityId, updates: AccountPatch },
    DeleteAccount { id: EntityId },
    AddTransaction(Transaction),
    UpdateTransaction { id: EntityId, updates: TransactionPatch },
    DeleteTransaction { id: EntityId },
    AddBudget(Budget),
    UpdateBudget { id: EntityId, updates: BudgetPatch },
    DeleteBudget { id: EntityId },
}

impl Mutation {
    /// The resource kind this mutation targets
    pub fn resource(&self) -> ResourceKind {
        match self {
            Mutation::AddCard(_) | Mutation::UpdateCard { .. } | Mutation::DeleteCard { .. } => {
                ResourceKind::Card
            }
            Mutation::AddAccount(_)
            | Mutation::UpdateAccount { .. }
            | Mutation::DeleteAccount { .. } => ResourceKind::Account,
            Mutation::AddTransaction(_)
            | Mutation::UpdateTransaction { .. }
            | Mutation::DeleteTransaction { .. } => ResourceKind::Transaction,
            Mutation::AddBudget(_)
            | Mutation::UpdateBudget { .. }
            | Mutation::DeleteBudget { .. } => ResourceKind::Budget,
        }
    }

    /// The action this mutation performs
    pub fn action(&self) -> ActionKind {
        match self {
            Mutation::AddCard(_)
            | Mutation::AddAccount(_)
            | Mutation::AddTransaction(_)
            | Mutation::AddBudget(_) => ActionKind::Add,
            Mutation::UpdateCard { .. }
            | Mutation::UpdateAccount { .. }
            | Mutation::UpdateTransaction { .. }
            | Mutation::UpdateBudget { .. } => ActionKind::Update,
            Mutation::DeleteCard { .. }
            | Mutation::DeleteAccount { .. }
            | Mutation::DeleteTransaction { .. }
            | Mutation::DeleteBudget { .. } => ActionKind::Delete,
        }
    }

    /// The storage/log discriminator for this mutation
    pub fn kind_name(&self) -> &'static str {
        match self {
            Mutation::AddCard(_) => "ADD_CARD",
            Mutation::UpdateCard { .. } => "UPDATE_CARD",
            Mutation::DeleteCard { .. } => "DELETE_CARD",
            Mutation::AddAccount(_) => "ADD_ACCOUNT",
            Mutation::UpdateAccount { .. } => "UPDATE_ACCOUNT",
            Mutation::DeleteAccount { .. } => "DELETE_ACCOUNT",
            Mutation::AddTransaction(_) => "ADD_TRANSACTION",
            Mutation::UpdateTransaction { .. } => "UPDATE_TRANSACTION",
            Mutation::DeleteTransaction { .. } => "DELETE_TRANSACTION",
            Mutation::AddBudget(_) => "ADD_BUDGET",
            Mutation::UpdateBudget { .. } => "UPDATE_BUDGET",
            Mutation::DeleteBudget { .. } => "DELETE_BUDGET",
        }
    }

    /// The id of the entity this mutation targets
    ///
    /// For adds this is the optimistic entity's provisional id.
    pub fn target_id(&self) -> &EntityId {
        match self {
            Mutation::AddCard(card) => card.id(),
            Mutation::AddAccount(account) => account.id(),
            Mutation::AddTransaction(tx) => tx.id(),
            Mutation::AddBudget(budget) => budget.id(),
            Mutation::UpdateCard { id, .. }
            | Mutation::DeleteCard { id }
            | Mutation::UpdateAccount { id, .. }
            | Mutation::DeleteAccount { id }
            | Mutation::UpdateTransaction { id, .. }
            | Mutation::DeleteTransaction { id }
            | Mutation::UpdateBudget { id, .. }
            | Mutation::DeleteBudget { id } => id,
        }
    }
}

impl std::fmt::Display for Mutation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.kind_name(), self.target_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    use crate::domain::card::CardKind;

    fn test_card() -> Card {
        Card::new("Visa", Decimal::new(100, 0), CardKind::Debit, "#fff").unwrap()
    }

    #[test]
    fn test_resource_and_action() {
        let add = Mutation::AddCard(test_card());
        assert_eq!(add.resource(), ResourceKind::Card);
        assert_eq!(add.action(), ActionKind::Add);

        let delete = Mutation::DeleteBudget {
            id: EntityId::persisted("b-1").unwrap(),
        };
        assert_eq!(delete.resource(), ResourceKind::Budget);
        assert_eq!(delete.action(), ActionKind::Delete);
    }

    #[test]
    fn test_kind_names() {
        let update = Mutation::UpdateTransaction {
            id: EntityId::persisted("t-1").unwrap(),
            updates: TransactionPatch::default(),
        };
        assert_eq!(update.kind_name(), "UPDATE_TRANSACTION");
    }

    #[test]
    fn test_target_id_for_add_is_pending() {
        let card = test_card();
        let id = card.id().clone();
        let add = Mutation::AddCard(card);
        assert_eq!(add.target_id(), &id);
        assert!(add.target_id().is_pending());
    }

    #[test]
    fn test_serde_tagged_form() {
        let mutation = Mutation::DeleteCard {
            id: EntityId::persisted("c-9").unwrap(),
        };
        let json = serde_json::to_value(&mutation).unwrap();
        assert_eq!(json["kind"], "DELETE_CARD");
        assert_eq!(json["data"]["id"], "c-9");
    }

    #[test]
    fn test_serde_roundtrip() {
        let mutation = Mutation::UpdateCard {
            id: EntityId::persisted("c-1").unwrap(),
            updates: CardPatch::with_balance(Decimal::new(9550, 2)),
        };
        let json = serde_json::to_string(&mutation).unwrap();
        let parsed: Mutation = serde_json::from_str(&json).unwrap();
        assert_eq!(mutation, parsed);
    }
}
