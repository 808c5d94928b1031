//! LedgerSync Store - Local durable storage
//!
//! SQLite-backed persistence for:
//! - The per-user snapshot (last-known collections + sync metadata)
//! - The per-user mutation queue (not-yet-confirmed operations)
//!
//! ## Architecture
//!
//! This crate implements the `ISnapshotStore` and `IMutationQueue` ports
//! from `ledgersync-core` using SQLite as the storage backend. It is a
//! driven (secondary) adapter in the hexagonal architecture.
//!
//! ## Key Components
//!
//! - [`DatabasePool`] - Connection pool with migration support
//! - [`SqliteSnapshotStore`] - `ISnapshotStore` implementation
//! - [`SqliteMutationQueue`] - `IMutationQueue` implementation
//! - [`StoreError`] - Error types for storage operations
//!
//! ## Usage
//!
//! ```no_run
//! use std::path::Path;
//! use ledgersync_store::{DatabasePool, SqliteSnapshotStore, SqliteMutationQueue};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let pool = DatabasePool::new(Path::new("/home/user/.local/share/ledgersync/state.db")).await?;
//! let snapshots = SqliteSnapshotStore::new(pool.pool().clone());
//! let queue = SqliteMutationQueue::new(pool.pool().clone());
//! # Ok(())
//! # }
//! ```

pub mod pool;
pub mod queue;
pub mod snapshot;

pub use pool::DatabasePool;
pub use queue::SqliteMutationQueue;
pub use snapshot::SqliteSnapshotStore;

/// Errors that can occur during storage operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Failed to establish a database connection
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// A database query failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Schema migration failed
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Serialization or deserialization of domain types failed
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::QueryFailed(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::SerializationError(e.to_string())
    }
}

/// Parse a `DateTime<Utc>` from an RFC 3339 text column
pub(crate) fn parse_rfc3339(s: &str) -> Result<chrono::DateTime<chrono::Utc>, StoreError> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .map_err(|e| {
            StoreError::SerializationError(format!("Failed to parse datetime '{}': {}", s, e))
        })
}
