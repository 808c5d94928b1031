//! In-memory collections and their durable snapshot form
//!
//! [`Collections`] holds the four entity collections for one user and is
//! the single source of truth while the application runs; the snapshot
//! store and the remote service are treated as eventually-consistent
//! mirrors of it. [`Snapshot`] is the durable form: the collections plus
//! the sync metadata (`last_sync`, `pending_sync`).
//!
//! Mutation application semantics (identical online and offline):
//! - add appends the whole optimistic entity,
//! - update shallow-merges a patch into the entity matched by id,
//! - delete removes the entity matched by id.
//!
//! Update or delete of an id that is not present is rejected before any
//! durability work happens, so a mistargeted mutation cannot corrupt
//! unrelated state.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::account::Account;
use super::budget::Budget;
use super::card::Card;
use super::errors::DomainError;
use super::mutation::Mutation;
use super::newtypes::EntityId;
use super::transaction::{SourceKind, Transaction};

// ============================================================================
// FundingSource
// ============================================================================

/// A borrowed view of the card or account a transaction is posted against
#[derive(Debug, Clone, Copy)]
pub enum FundingSource<'a> {
    Card(&'a Card),
    Account(&'a Account),
}

impl FundingSource<'_> {
    /// The source's current stored balance
    pub fn balance(&self) -> Decimal {
        match self {
            FundingSource::Card(card) => card.balance(),
            FundingSource::Account(account) => account.balance(),
        }
    }

    /// The source's id
    pub fn id(&self) -> &EntityId {
        match self {
            FundingSource::Card(card) => card.id(),
            FundingSource::Account(account) => account.id(),
        }
    }

    /// Which kind of source this is
    pub fn kind(&self) -> SourceKind {
        match self {
            FundingSource::Card(_) => SourceKind::Card,
            FundingSource::Account(_) => SourceKind::Account,
        }
    }
}

// ============================================================================
// Collections
// ============================================================================

/// The four entity collections for one user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collections {
    pub cards: Vec<Card>,
    pub accounts: Vec<Account>,
    pub transactions: Vec<Transaction>,
    pub budgets: Vec<Budget>,
}

impl Collections {
    /// Creates empty collections
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if all four collections are empty
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
            && self.accounts.is_empty()
            && self.transactions.is_empty()
            && self.budgets.is_empty()
    }

    /// Total number of entities across the four collections
    pub fn len(&self) -> usize {
        self.cards.len() + self.accounts.len() + self.transactions.len() + self.budgets.len()
    }

    /// Applies a mutation to the in-memory state
    ///
    /// # Errors
    /// - `DomainError::UnknownEntity` when an update or delete targets an
    ///   id that is not in the collection.
    /// - `DomainError::DuplicateBudget` when a budget add would violate
    ///   the one-budget-per-category invariant.
    pub fn apply(&mut self, mutation: &Mutation) -> Result<(), DomainError> {
        match mutation {
            Mutation::AddCard(card) => {
                self.cards.push(card.clone());
                Ok(())
            }
            Mutation::UpdateCard { id, updates } => {
                let card = self
                    .cards
                    .iter_mut()
                    .find(|c| c.id() == id)
                    .ok_or_else(|| DomainError::UnknownEntity {
                        resource: "card",
                        id: id.to_wire(),
                    })?;
                card.apply(updates);
                Ok(())
            }
            Mutation::DeleteCard { id } => {
                Self::remove(&mut self.cards, "card", id, |c| c.id())
            }
            Mutation::AddAccount(account) => {
                self.accounts.push(account.clone());
                Ok(())
            }
            Mutation::UpdateAccount { id, updates } => {
                let account = self
                    .accounts
                    .iter_mut()
                    .find(|a| a.id() == id)
                    .ok_or_else(|| DomainError::UnknownEntity {
                        resource: "account",
                        id: id.to_wire(),
                    })?;
                account.apply(updates);
                Ok(())
            }
            Mutation::DeleteAccount { id } => {
                Self::remove(&mut self.accounts, "account", id, |a| a.id())
            }
            Mutation::AddTransaction(tx) => {
                self.transactions.push(tx.clone());
                Ok(())
            }
            Mutation::UpdateTransaction { id, updates } => {
                let tx = self
                    .transactions
                    .iter_mut()
                    .find(|t| t.id() == id)
                    .ok_or_else(|| DomainError::UnknownEntity {
                        resource: "transaction",
                        id: id.to_wire(),
                    })?;
                tx.apply(updates);
                Ok(())
            }
            Mutation::DeleteTransaction { id } => {
                Self::remove(&mut self.transactions, "transaction", id, |t| t.id())
            }
            Mutation::AddBudget(budget) => {
                if self
                    .budgets
                    .iter()
                    .any(|b| b.category() == budget.category())
                {
                    return Err(DomainError::DuplicateBudget(budget.category().to_string()));
                }
                self.budgets.push(budget.clone());
                Ok(())
            }
            Mutation::UpdateBudget { id, updates } => {
                let budget = self
                    .budgets
                    .iter_mut()
                    .find(|b| b.id() == id)
                    .ok_or_else(|| DomainError::UnknownEntity {
                        resource: "budget",
                        id: id.to_wire(),
                    })?;
                budget.apply(updates);
                Ok(())
            }
            Mutation::DeleteBudget { id } => {
                Self::remove(&mut self.budgets, "budget", id, |b| b.id())
            }
        }
    }

    fn remove<T>(
        items: &mut Vec<T>,
        resource: &'static str,
        id: &EntityId,
        id_of: impl Fn(&T) -> &EntityId,
    ) -> Result<(), DomainError> {
        let before = items.len();
        items.retain(|item| id_of(item) != id);
        if items.len() == before {
            return Err(DomainError::UnknownEntity {
                resource,
                id: id.to_wire(),
            });
        }
        Ok(())
    }

    /// Looks up the funding source a transaction references
    ///
    /// Returns `None` if no live card/account of the given kind carries
    /// the id; callers treat that as a referential failure.
    pub fn find_source(&self, id: &EntityId, kind: SourceKind) -> Option<FundingSource<'_>> {
        match kind {
            SourceKind::Card => self
                .cards
                .iter()
                .find(|c| c.id() == id)
                .map(FundingSource::Card),
            SourceKind::Account => self
                .accounts
                .iter()
                .find(|a| a.id() == id)
                .map(FundingSource::Account),
        }
    }

    /// Replaces the card matched by `old_id` with a server-confirmed card
    ///
    /// Returns false if no card carries `old_id` (the optimistic entity
    /// may already have been superseded by a refetch).
    pub fn replace_card(&mut self, old_id: &EntityId, confirmed: Card) -> bool {
        Self::replace(&mut self.cards, old_id, confirmed, |c| c.id())
    }

    /// Replaces the account matched by `old_id` with a server-confirmed one
    pub fn replace_account(&mut self, old_id: &EntityId, confirmed: Account) -> bool {
        Self::replace(&mut self.accounts, old_id, confirmed, |a| a.id())
    }

    /// Replaces the transaction matched by `old_id` with a server-confirmed one
    pub fn replace_transaction(&mut self, old_id: &EntityId, confirmed: Transaction) -> bool {
        Self::replace(&mut self.transactions, old_id, confirmed, |t| t.id())
    }

    /// Replaces the budget matched by `old_id` with a server-confirmed one
    pub fn replace_budget(&mut self, old_id: &EntityId, confirmed: Budget) -> bool {
        Self::replace(&mut self.budgets, old_id, confirmed, |b| b.id())
    }

    fn replace<T>(
        items: &mut [T],
        old_id: &EntityId,
        confirmed: T,
        id_of: impl Fn(&T) -> &EntityId,
    ) -> bool {
        match items.iter_mut().find(|item| id_of(item) == old_id) {
            Some(slot) => {
                *slot = confirmed;
                true
            }
            None => false,
        }
    }

    /// Returns a copy with every entity still carrying a pending id removed
    ///
    /// Used for authoritative (post-sync) snapshot writes and after the
    /// post-replay refetch: only server-assigned ids are canonical.
    pub fn without_pending(&self) -> Self {
        Self {
            cards: self
                .cards
                .iter()
                .filter(|c| c.id().is_persisted())
                .cloned()
                .collect(),
            accounts: self
                .accounts
                .iter()
                .filter(|a| a.id().is_persisted())
                .cloned()
                .collect(),
            transactions: self
                .transactions
                .iter()
                .filter(|t| t.id().is_persisted())
                .cloned()
                .collect(),
            budgets: self
                .budgets
                .iter()
                .filter(|b| b.id().is_persisted())
                .cloned()
                .collect(),
        }
    }

    /// Returns true if any entity still carries a pending id
    pub fn has_pending(&self) -> bool {
        self.cards.iter().any(|c| c.id().is_pending())
            || self.accounts.iter().any(|a| a.id().is_pending())
            || self.transactions.iter().any(|t| t.id().is_pending())
            || self.budgets.iter().any(|b| b.id().is_pending())
    }
}

// ============================================================================
// Snapshot
// ============================================================================

/// The durable form of a user's collections plus sync metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// The four collections as persisted
    pub collections: Collections,
    /// When the snapshot last reflected confirmed server state
    pub last_sync: Option<DateTime<Utc>>,
    /// True when the snapshot contains purely local optimism that has not
    /// been confirmed by the server
    pub pending_sync: bool,
}

impl Snapshot {
    /// Snapshot of confirmed server state: pending ids are discarded as
    /// stale and `pending_sync` is false.
    pub fn authoritative(collections: &Collections, last_sync: Option<DateTime<Utc>>) -> Self {
        Self {
            collections: collections.without_pending(),
            last_sync,
            pending_sync: false,
        }
    }

    /// Snapshot of local optimism: pending ids are retained and
    /// `pending_sync` is true.
    pub fn optimistic(collections: &Collections, last_sync: Option<DateTime<Utc>>) -> Self {
        Self {
            collections: collections.clone(),
            last_sync,
            pending_sync: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::domain::budget::BudgetPatch;
    use crate::domain::card::{CardKind, CardPatch};
    use crate::domain::transaction::Direction;

    fn persisted_card(id: &str, balance: Decimal) -> Card {
        let now = Utc::now();
        Card::restore(
            EntityId::persisted(id).unwrap(),
            "Card",
            balance,
            CardKind::Debit,
            "#fff",
            now,
            now,
        )
    }

    fn seeded() -> Collections {
        let mut collections = Collections::new();
        collections.cards.push(persisted_card("c-1", Decimal::new(100, 0)));
        collections
    }

    #[test]
    fn test_apply_add_appends() {
        let mut collections = seeded();
        let card = Card::new("New", Decimal::ZERO, CardKind::Credit, "#000").unwrap();
        collections.apply(&Mutation::AddCard(card)).unwrap();
        assert_eq!(collections.cards.len(), 2);
    }

    #[test]
    fn test_apply_update_merges() {
        let mut collections = seeded();
        collections
            .apply(&Mutation::UpdateCard {
                id: EntityId::persisted("c-1").unwrap(),
                updates: CardPatch::with_balance(Decimal::new(42, 0)),
            })
            .unwrap();
        assert_eq!(collections.cards[0].balance(), Decimal::new(42, 0));
        assert_eq!(collections.cards[0].name(), "Card");
    }

    #[test]
    fn test_apply_delete_removes() {
        let mut collections = seeded();
        collections
            .apply(&Mutation::DeleteCard {
                id: EntityId::persisted("c-1").unwrap(),
            })
            .unwrap();
        assert!(collections.cards.is_empty());
    }

    #[test]
    fn test_apply_update_unknown_id_fails() {
        let mut collections = seeded();
        let result = collections.apply(&Mutation::UpdateCard {
            id: EntityId::persisted("missing").unwrap(),
            updates: CardPatch::new(),
        });
        assert!(matches!(
            result,
            Err(DomainError::UnknownEntity { resource: "card", .. })
        ));
        // untouched
        assert_eq!(collections.cards.len(), 1);
    }

    #[test]
    fn test_apply_delete_unknown_id_fails() {
        let mut collections = Collections::new();
        let result = collections.apply(&Mutation::DeleteTransaction {
            id: EntityId::persisted("missing").unwrap(),
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_duplicate_budget_rejected() {
        let mut collections = Collections::new();
        let food = Budget::new("food", Decimal::new(300, 0)).unwrap();
        collections.apply(&Mutation::AddBudget(food)).unwrap();

        let another = Budget::new("food", Decimal::new(500, 0)).unwrap();
        let result = collections.apply(&Mutation::AddBudget(another));
        assert!(matches!(result, Err(DomainError::DuplicateBudget(_))));
        assert_eq!(collections.budgets.len(), 1);
    }

    #[test]
    fn test_update_budget_limit() {
        let mut collections = Collections::new();
        let budget = Budget::new("food", Decimal::new(300, 0)).unwrap();
        let id = budget.id().clone();
        collections.apply(&Mutation::AddBudget(budget)).unwrap();

        collections
            .apply(&Mutation::UpdateBudget {
                id,
                updates: BudgetPatch::with_limit(Decimal::new(450, 0)),
            })
            .unwrap();
        assert_eq!(collections.budgets[0].limit(), Decimal::new(450, 0));
    }

    #[test]
    fn test_find_source_by_kind() {
        let collections = seeded();
        let id = EntityId::persisted("c-1").unwrap();

        let source = collections.find_source(&id, SourceKind::Card).unwrap();
        assert_eq!(source.balance(), Decimal::new(100, 0));

        // the same id is not an account
        assert!(collections.find_source(&id, SourceKind::Account).is_none());
    }

    #[test]
    fn test_replace_card_by_pending_id() {
        let mut collections = Collections::new();
        let optimistic = Card::new("Visa", Decimal::ZERO, CardKind::Debit, "#fff").unwrap();
        let pending_id = optimistic.id().clone();
        collections.apply(&Mutation::AddCard(optimistic)).unwrap();

        let confirmed = persisted_card("srv-1", Decimal::ZERO);
        assert!(collections.replace_card(&pending_id, confirmed));
        assert!(collections.cards[0].id().is_persisted());

        // replacing again finds nothing
        let confirmed = persisted_card("srv-2", Decimal::ZERO);
        assert!(!collections.replace_card(&pending_id, confirmed));
    }

    #[test]
    fn test_without_pending_filters_every_collection() {
        let mut collections = seeded();
        collections.cards.push(Card::new("P", Decimal::ZERO, CardKind::Debit, "#fff").unwrap());
        collections
            .transactions
            .push(
                Transaction::new(
                    "Coffee",
                    Decimal::ONE,
                    Direction::Expense,
                    "food",
                    NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
                    None,
                    EntityId::persisted("c-1").unwrap(),
                    SourceKind::Card,
                )
                .unwrap(),
            );
        assert!(collections.has_pending());

        let filtered = collections.without_pending();
        assert_eq!(filtered.cards.len(), 1);
        assert!(filtered.transactions.is_empty());
        assert!(!filtered.has_pending());
    }

    #[test]
    fn test_snapshot_constructors() {
        let mut collections = seeded();
        collections.cards.push(Card::new("P", Decimal::ZERO, CardKind::Debit, "#fff").unwrap());

        let optimistic = Snapshot::optimistic(&collections, None);
        assert!(optimistic.pending_sync);
        assert_eq!(optimistic.collections.cards.len(), 2);

        let authoritative = Snapshot::authoritative(&collections, Some(Utc::now()));
        assert!(!authoritative.pending_sync);
        assert_eq!(authoritative.collections.cards.len(), 1);
    }
}
