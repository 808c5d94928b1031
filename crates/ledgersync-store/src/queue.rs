//! SQLite implementation of IMutationQueue
//!
//! An append-only per-user log. The autoincrement `id` column is the
//! replay order; the mutation serializes as a self-describing JSON
//! payload plus a redundant `kind` tag column for debugging queries.

use sqlx::{Row, SqlitePool};

use ledgersync_core::domain::{Mutation, UserKey};
use ledgersync_core::ports::{IMutationQueue, QueuedMutation};

use crate::{parse_rfc3339, StoreError};

/// SQLite-based implementation of the mutation queue port
pub struct SqliteMutationQueue {
    pool: SqlitePool,
}

impl SqliteMutationQueue {
    /// Creates a new queue instance with the given connection pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl IMutationQueue for SqliteMutationQueue {
    async fn enqueue(&self, op: &QueuedMutation) -> anyhow::Result<()> {
        let payload = serde_json::to_string(&op.mutation).map_err(StoreError::from)?;

        sqlx::query(
            "INSERT INTO mutation_queue (user_key, kind, payload, enqueued_at) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(op.user.as_str())
        .bind(op.mutation.kind_name())
        .bind(payload)
        .bind(op.enqueued_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(StoreError::from)?;

        tracing::debug!(
            user = %op.user,
            kind = op.mutation.kind_name(),
            "Mutation enqueued"
        );

        Ok(())
    }

    async fn drain(&self, user: &UserKey) -> anyhow::Result<Vec<QueuedMutation>> {
        let rows = sqlx::query(
            "SELECT id, payload, enqueued_at FROM mutation_queue \
             WHERE user_key = ? ORDER BY id ASC",
        )
        .bind(user.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from)?;

        let mut ops = Vec::with_capacity(rows.len());
        for row in rows {
            let id: i64 = row.get("id");
            let payload: String = row.get("payload");
            let enqueued_at: String = row.get("enqueued_at");

            let mutation: Mutation = serde_json::from_str(&payload).map_err(StoreError::from)?;

            ops.push(QueuedMutation {
                id: Some(id),
                user: user.clone(),
                mutation,
                enqueued_at: parse_rfc3339(&enqueued_at)?,
            });
        }

        Ok(ops)
    }

    async fn clear(&self, user: &UserKey) -> anyhow::Result<()> {
        let result = sqlx::query("DELETE FROM mutation_queue WHERE user_key = ?")
            .bind(user.as_str())
            .execute(&self.pool)
            .await
            .map_err(StoreError::from)?;

        tracing::debug!(
            user = %user,
            removed = result.rows_affected(),
            "Mutation queue cleared"
        );
        Ok(())
    }

    async fn len(&self, user: &UserKey) -> anyhow::Result<u64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM mutation_queue WHERE user_key = ?")
            .bind(user.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(StoreError::from)?;

        let n: i64 = row.get("n");
        Ok(n as u64)
    }
}
