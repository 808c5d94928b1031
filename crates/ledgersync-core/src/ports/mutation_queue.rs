//! Mutation queue port (driven/secondary port)
//!
//! A durable, append-only, per-user ordered log of not-yet-confirmed
//! mutations. Insertion order is preserved and is the *only* ordering
//! guarantee: no priority, no coalescing of redundant operations — an add
//! followed by a delete of the same provisional entity both remain queued
//! and are replayed in order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Mutation, UserKey};

/// A mutation as recorded in the durable queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedMutation {
    /// Storage-assigned sequence id (`None` before the record is enqueued)
    pub id: Option<i64>,
    /// Owning principal the mutation belongs to
    pub user: UserKey,
    /// The mutation, verbatim as it was applied optimistically
    pub mutation: Mutation,
    /// When the mutation entered the queue
    pub enqueued_at: DateTime<Utc>,
}

impl QueuedMutation {
    /// Creates a queue record for a mutation, stamped now
    pub fn new(user: UserKey, mutation: Mutation) -> Self {
        Self {
            id: None,
            user,
            mutation,
            enqueued_at: Utc::now(),
        }
    }
}

/// Port trait for the durable mutation queue
#[async_trait::async_trait]
pub trait IMutationQueue: Send + Sync {
    /// Appends a record to the user's log
    async fn enqueue(&self, op: &QueuedMutation) -> anyhow::Result<()>;

    /// Returns all queued records for the user in enqueue order
    ///
    /// Does not remove them; [`clear`](IMutationQueue::clear) is called
    /// separately once a replay cycle has completed.
    async fn drain(&self, user: &UserKey) -> anyhow::Result<Vec<QueuedMutation>>;

    /// Removes all records for the user
    async fn clear(&self, user: &UserKey) -> anyhow::Result<()>;

    /// Number of records queued for the user (sync-pending indicator)
    async fn len(&self, user: &UserKey) -> anyhow::Result<u64>;
}
