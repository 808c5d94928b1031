//! Transaction domain entity
//!
//! A single income or expense movement posted against exactly one funding
//! source (a card or an account). The amount is always non-negative; the
//! direction carries the sign. Whenever a transaction mutation is issued,
//! the reconciliation engine derives a balance delta for the funding
//! source as a *separate* mutation (see
//! [`balance`](super::balance)).

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::errors::DomainError;
use super::newtypes::EntityId;

/// Direction of a money movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Money entering the funding source
    Income,
    /// Money leaving the funding source
    Expense,
}

/// Which kind of entity a transaction is posted against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// The source is a [`Card`](super::card::Card)
    Card,
    /// The source is an [`Account`](super::account::Account)
    Account,
}

/// An income or expense movement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    id: EntityId,
    /// Short human-readable title ("Coffee", "Salary")
    title: String,
    /// Unsigned amount; the direction carries the sign
    amount: Decimal,
    /// Income or expense
    direction: Direction,
    /// Free-form category tag used for budgets and aggregates
    category: String,
    /// Calendar date the movement occurred on
    date: NaiveDate,
    /// Optional longer description
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    /// Funding source this transaction is posted against
    source_id: EntityId,
    /// Whether the source is a card or an account
    source_kind: SourceKind,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Creates a new locally-originated transaction with a provisional id
    ///
    /// # Errors
    /// Returns `DomainError::ValidationFailed` if the title or category is
    /// empty, or if the amount is negative.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        title: impl Into<String>,
        amount: Decimal,
        direction: Direction,
        category: impl Into<String>,
        date: NaiveDate,
        description: Option<String>,
        source_id: EntityId,
        source_kind: SourceKind,
    ) -> Result<Self, DomainError> {
        let title = title.into();
        let category = category.into();
        if title.is_empty() {
            return Err(DomainError::ValidationFailed(
                "Transaction title cannot be empty".to_string(),
            ));
        }
        if category.is_empty() {
            return Err(DomainError::ValidationFailed(
                "Transaction category cannot be empty".to_string(),
            ));
        }
        if amount.is_sign_negative() {
            return Err(DomainError::ValidationFailed(format!(
                "Transaction amount cannot be negative: {amount}"
            )));
        }

        let now = Utc::now();
        Ok(Self {
            id: EntityId::new_pending(),
            title,
            amount,
            direction,
            category,
            date,
            description,
            source_id,
            source_kind,
            created_at: now,
            updated_at: now,
        })
    }

    /// Rehydrates a transaction from already-validated parts
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: EntityId,
        title: impl Into<String>,
        amount: Decimal,
        direction: Direction,
        category: impl Into<String>,
        date: NaiveDate,
        description: Option<String>,
        source_id: EntityId,
        source_kind: SourceKind,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            amount,
            direction,
            category: category.into(),
            date,
            description,
            source_id,
            source_kind,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> &EntityId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn source_id(&self) -> &EntityId {
        &self.source_id
    }

    pub fn source_kind(&self) -> SourceKind {
        self.source_kind
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Shallow-merges a patch into this transaction
    ///
    /// The funding source reference is deliberately not patchable: moving a
    /// transaction between sources would require reversing one balance and
    /// applying another, which the engine models as delete + add instead.
    pub fn apply(&mut self, patch: &TransactionPatch) {
        if let Some(ref title) = patch.title {
            self.title = title.clone();
        }
        if let Some(amount) = patch.amount {
            self.amount = amount;
        }
        if let Some(direction) = patch.direction {
            self.direction = direction;
        }
        if let Some(ref category) = patch.category {
            self.category = category.clone();
        }
        if let Some(date) = patch.date {
            self.date = date;
        }
        if let Some(ref description) = patch.description {
            self.description = Some(description.clone());
        }
        if let Some(updated_at) = patch.updated_at {
            self.updated_at = updated_at;
        }
    }
}

/// Partial update for a [`Transaction`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl TransactionPatch {
    pub fn new() -> Self {
        Self::default()
    }
}
