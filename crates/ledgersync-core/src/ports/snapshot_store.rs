//! Snapshot store port (driven/secondary port)
//!
//! Durable key-value storage of one [`Snapshot`] per user: the last-known
//! full collections plus sync metadata.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because storage errors are adapter-specific
//!   (SQLite, filesystem, ...) and don't need domain-level classification;
//!   the engine treats any store failure the same way (log and continue —
//!   the store is a cache, not the system of record).
//! - `save` is a full replacement of the user's record; partial updates
//!   are not part of the contract.

use crate::domain::{Snapshot, UserKey};

/// Port trait for durable snapshot persistence
#[async_trait::async_trait]
pub trait ISnapshotStore: Send + Sync {
    /// Persists a full replacement of the user's snapshot
    async fn save(&self, user: &UserKey, snapshot: &Snapshot) -> anyhow::Result<()>;

    /// Loads the user's snapshot, or `None` when no data has been saved
    async fn load(&self, user: &UserKey) -> anyhow::Result<Option<Snapshot>>;

    /// Removes all snapshot state for the user (logout / data reset)
    async fn clear(&self, user: &UserKey) -> anyhow::Result<()>;
}
