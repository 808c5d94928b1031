//! Card domain entity
//!
//! A payment card owned by a user. The balance held here is a
//! *derived-but-stored* value: every transaction mutation posted against
//! the card applies its delta through the ordinary card-update path, and
//! the stored figure is never recomputed from transaction history.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::errors::DomainError;
use super::newtypes::EntityId;

/// Kind of payment card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardKind {
    /// Credit card (balance may go negative)
    Credit,
    /// Debit card
    Debit,
}

/// A payment card tracked by the finance application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    /// Entity identifier (provisional until confirmed by the server)
    id: EntityId,
    /// Display name shown in the UI
    name: String,
    /// Current balance (signed; derived from transaction mutations)
    balance: Decimal,
    /// Credit or debit
    kind: CardKind,
    /// Display color tag
    color: String,
    /// When the card was created
    created_at: DateTime<Utc>,
    /// When the card was last modified
    updated_at: DateTime<Utc>,
}

impl Card {
    /// Creates a new locally-originated card with a provisional id
    ///
    /// # Errors
    /// Returns `DomainError::ValidationFailed` if the display name is empty.
    pub fn new(
        name: impl Into<String>,
        balance: Decimal,
        kind: CardKind,
        color: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let name = name.into();
        if name.is_empty() {
            return Err(DomainError::ValidationFailed(
                "Card name cannot be empty".to_string(),
            ));
        }

        let now = Utc::now();
        Ok(Self {
            id: EntityId::new_pending(),
            name,
            balance,
            kind,
            color: color.into(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Rehydrates a card from already-validated parts (adapter/test use)
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: EntityId,
        name: impl Into<String>,
        balance: Decimal,
        kind: CardKind,
        color: impl Into<String>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            balance,
            kind,
            color: color.into(),
            created_at,
            updated_at,
        }
    }

    // --- Getters ---

    /// Returns the card's identifier
    pub fn id(&self) -> &EntityId {
        &self.id
    }

    /// Returns the display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the current balance
    pub fn balance(&self) -> Decimal {
        self.balance
    }

    /// Returns the card kind
    pub fn kind(&self) -> CardKind {
        self.kind
    }

    /// Returns the display color tag
    pub fn color(&self) -> &str {
        &self.color
    }

    /// Returns when the card was created
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns when the card was last modified
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Shallow-merges a patch into this card
    ///
    /// Only fields present in the patch are overwritten, matching the
    /// update-mutation semantics of the reconciliation engine.
    pub fn apply(&mut self, patch: &CardPatch) {
        if let Some(ref name) = patch.name {
            self.name = name.clone();
        }
        if let Some(balance) = patch.balance {
            self.balance = balance;
        }
        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
        if let Some(ref color) = patch.color {
            self.color = color.clone();
        }
        if let Some(updated_at) = patch.updated_at {
            self.updated_at = updated_at;
        }
    }
}

/// Partial update for a [`Card`]
///
/// All fields are optional; `None` means "leave unchanged". This is both
/// the in-memory merge payload and the PATCH request body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardPatch {
    /// New display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New balance
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<Decimal>,
    /// New card kind
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<CardKind>,
    /// New color tag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// New modification timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl CardPatch {
    /// Creates an empty patch (no changes)
    pub fn new() -> Self {
        Self::default()
    }

    /// Patch that only adjusts the balance (used by balance derivation)
    pub fn with_balance(balance: Decimal) -> Self {
        Self {
            balance: Some(balance),
            ..Self::default()
        }
    }
}
