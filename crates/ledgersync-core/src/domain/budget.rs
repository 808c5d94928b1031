//! Budget domain entity
//!
//! A monthly spending limit for one category. At most one budget exists
//! per (user, category); the invariant is enforced when a budget add is
//! applied to the in-memory collections.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::errors::DomainError;
use super::newtypes::EntityId;

/// A monthly spending limit for a category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    id: EntityId,
    /// Category the limit applies to (unique per user)
    category: String,
    /// Monthly spending limit
    limit: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Budget {
    /// Creates a new locally-originated budget with a provisional id
    ///
    /// # Errors
    /// Returns `DomainError::ValidationFailed` if the category is empty or
    /// the limit is negative.
    pub fn new(category: impl Into<String>, limit: Decimal) -> Result<Self, DomainError> {
        let category = category.into();
        if category.is_empty() {
            return Err(DomainError::ValidationFailed(
                "Budget category cannot be empty".to_string(),
            ));
        }
        if limit.is_sign_negative() {
            return Err(DomainError::ValidationFailed(format!(
                "Budget limit cannot be negative: {limit}"
            )));
        }

        let now = Utc::now();
        Ok(Self {
            id: EntityId::new_pending(),
            category,
            limit,
            created_at: now,
            updated_at: now,
        })
    }

    /// Rehydrates a budget from already-validated parts
    pub fn restore(
        id: EntityId,
        category: impl Into<String>,
        limit: Decimal,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            category: category.into(),
            limit,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> &EntityId {
        &self.id
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn limit(&self) -> Decimal {
        self.limit
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Shallow-merges a patch into this budget
    ///
    /// The category is not patchable; re-categorizing is modeled as
    /// delete + add to keep the per-category uniqueness check in one place.
    pub fn apply(&mut self, patch: &BudgetPatch) {
        if let Some(limit) = patch.limit {
            self.limit = limit;
        }
        if let Some(updated_at) = patch.updated_at {
            self.updated_at = updated_at;
        }
    }
}

/// Partial update for a [`Budget`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl BudgetPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Patch that only adjusts the limit
    pub fn with_limit(limit: Decimal) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }
}
