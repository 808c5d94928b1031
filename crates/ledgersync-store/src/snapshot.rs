//! SQLite implementation of ISnapshotStore
//!
//! One row per user; each of the four collections is stored as a JSON
//! text column so the durable shape mirrors the in-memory shape exactly.
//!
//! ## Type Mapping
//!
//! | Domain Type        | SQL Type | Strategy                              |
//! |--------------------|----------|---------------------------------------|
//! | UserKey            | TEXT     | String via `.as_str()`                |
//! | Vec<Card> etc.     | TEXT     | serde_json serialization              |
//! | DateTime<Utc>      | TEXT     | RFC 3339 via `to_rfc3339()`           |
//! | pending_sync       | INTEGER  | 0 / 1                                 |

use chrono::Utc;
use sqlx::{Row, SqlitePool};

use ledgersync_core::domain::{Collections, Snapshot, UserKey};
use ledgersync_core::ports::ISnapshotStore;

use crate::{parse_rfc3339, StoreError};

/// SQLite-based implementation of the snapshot store port
pub struct SqliteSnapshotStore {
    pool: SqlitePool,
}

impl SqliteSnapshotStore {
    /// Creates a new store instance with the given connection pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ISnapshotStore for SqliteSnapshotStore {
    async fn save(&self, user: &UserKey, snapshot: &Snapshot) -> anyhow::Result<()> {
        let cards = serde_json::to_string(&snapshot.collections.cards).map_err(StoreError::from)?;
        let accounts =
            serde_json::to_string(&snapshot.collections.accounts).map_err(StoreError::from)?;
        let transactions =
            serde_json::to_string(&snapshot.collections.transactions).map_err(StoreError::from)?;
        let budgets =
            serde_json::to_string(&snapshot.collections.budgets).map_err(StoreError::from)?;

        sqlx::query(
            r#"
            INSERT INTO snapshots
                (user_key, cards, accounts, transactions, budgets, last_sync, pending_sync, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(user_key) DO UPDATE SET
                cards = excluded.cards,
                accounts = excluded.accounts,
                transactions = excluded.transactions,
                budgets = excluded.budgets,
                last_sync = excluded.last_sync,
                pending_sync = excluded.pending_sync,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(user.as_str())
        .bind(cards)
        .bind(accounts)
        .bind(transactions)
        .bind(budgets)
        .bind(snapshot.last_sync.map(|dt| dt.to_rfc3339()))
        .bind(i64::from(snapshot.pending_sync))
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(StoreError::from)?;

        tracing::debug!(
            user = %user,
            pending_sync = snapshot.pending_sync,
            entities = snapshot.collections.len(),
            "Snapshot saved"
        );

        Ok(())
    }

    async fn load(&self, user: &UserKey) -> anyhow::Result<Option<Snapshot>> {
        let row = sqlx::query(
            "SELECT cards, accounts, transactions, budgets, last_sync, pending_sync \
             FROM snapshots WHERE user_key = ?",
        )
        .bind(user.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::from)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let cards: String = row.get("cards");
        let accounts: String = row.get("accounts");
        let transactions: String = row.get("transactions");
        let budgets: String = row.get("budgets");
        let last_sync: Option<String> = row.get("last_sync");
        let pending_sync: i64 = row.get("pending_sync");

        let collections = Collections {
            cards: serde_json::from_str(&cards).map_err(StoreError::from)?,
            accounts: serde_json::from_str(&accounts).map_err(StoreError::from)?,
            transactions: serde_json::from_str(&transactions).map_err(StoreError::from)?,
            budgets: serde_json::from_str(&budgets).map_err(StoreError::from)?,
        };

        let last_sync = match last_sync {
            Some(ref s) if !s.is_empty() => Some(parse_rfc3339(s)?),
            _ => None,
        };

        Ok(Some(Snapshot {
            collections,
            last_sync,
            pending_sync: pending_sync != 0,
        }))
    }

    async fn clear(&self, user: &UserKey) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM snapshots WHERE user_key = ?")
            .bind(user.as_str())
            .execute(&self.pool)
            .await
            .map_err(StoreError::from)?;

        tracing::debug!(user = %user, "Snapshot cleared");
        Ok(())
    }
}
