//! Account domain entity
//!
//! A bank account owned by a user. Like [`Card`](super::card::Card), the
//! stored balance is derived from transaction mutations, never recomputed
//! from history.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::errors::DomainError;
use super::newtypes::EntityId;

/// Kind of bank account
///
/// Only checking accounts exist today; the enum is non-exhaustive so new
/// kinds can be introduced without breaking downstream matches.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    /// Standard checking account
    Checking,
}

/// A bank account tracked by the finance application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    id: EntityId,
    /// Name of the bank holding the account
    bank_name: String,
    /// Display name shown in the UI
    name: String,
    /// Current balance (signed; derived from transaction mutations)
    balance: Decimal,
    kind: AccountKind,
    /// Display color tag
    color: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Account {
    /// Creates a new locally-originated account with a provisional id
    ///
    /// # Errors
    /// Returns `DomainError::ValidationFailed` if the bank name or display
    /// name is empty.
    pub fn new(
        bank_name: impl Into<String>,
        name: impl Into<String>,
        balance: Decimal,
        color: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let bank_name = bank_name.into();
        let name = name.into();
        if bank_name.is_empty() {
            return Err(DomainError::ValidationFailed(
                "Bank name cannot be empty".to_string(),
            ));
        }
        if name.is_empty() {
            return Err(DomainError::ValidationFailed(
                "Account name cannot be empty".to_string(),
            ));
        }

        let now = Utc::now();
        Ok(Self {
            id: EntityId::new_pending(),
            bank_name,
            name,
            balance,
            kind: AccountKind::Checking,
            color: color.into(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Rehydrates an account from already-validated parts (adapter/test use)
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: EntityId,
        bank_name: impl Into<String>,
        name: impl Into<String>,
        balance: Decimal,
        kind: AccountKind,
        color: impl Into<String>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            bank_name: bank_name.into(),
            name: name.into(),
            balance,
            kind,
            color: color.into(),
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> &EntityId {
        &self.id
    }

    pub fn bank_name(&self) -> &str {
        &self.bank_name
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    pub fn kind(&self) -> AccountKind {
        self.kind
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Shallow-merges a patch into this account
    pub fn apply(&mut self, patch: &AccountPatch) {
        if let Some(ref bank_name) = patch.bank_name {
            self.bank_name = bank_name.clone();
        }
        if let Some(ref name) = patch.name {
            self.name = name.clone();
        }
        if let Some(balance) = patch.balance {
            self.balance = balance;
        }
        if let Some(ref color) = patch.color {
            self.color = color.clone();
        }
        if let Some(updated_at) = patch.updated_at {
            self.updated_at = updated_at;
        }
    }
}

/// Partial update for an [`Account`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl AccountPatch {
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

#[cfg(test)]
mod tests {
    use super::*;

    fn test_account() -> Account {
        Account::new("Acme Bank", "Everyday", Decimal::new(50000, 2), "#10B981").unwrap()
    }

    #[test]
    fn test_new_defaults_to_checking() {
        let account = test_account();
        assert!(account.id().is_pending());
        assert_eq!(account.kind(), AccountKind::Checking);
        assert_eq!(account.bank_name(), "Acme Bank");
    }

    #[test]
    fn test_new_validates_names() {
        assert!(Account::new("", "Everyday", Decimal::ZERO, "#fff").is_err());
        assert!(Account::new("Acme", "", Decimal::ZERO, "#fff").is_err());
    }

    #[test]
    fn test_apply_balance_only() {
        let mut account = test_account();
        account.apply(&AccountPatch::with_balance(Decimal::new(49550, 2)));
        assert_eq!(account.balance(), Decimal::new(49550, 2));
        assert_eq!(account.name(), "Everyday");
    }

    #[test]
    fn test_wire_format() {
        let json = serde_json::to_value(test_account()).unwrap();
        assert!(json.get("bankName").is_some());
        assert_eq!(json["kind"], "checking");
    }

    #[test]
    fn test_serde_roundtrip() {
        let account = test_account();
        let json = serde_json::to_string(&account).unwrap();
        let parsed: Account = serde_json::from_str(&json).unwrap();
        assert_eq!(account, parsed);
    }
}
