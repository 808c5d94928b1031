//! Port definitions (hexagonal architecture)
//!
//! This module defines the trait interfaces that adapter crates implement:
//! - [`IResourceService`] - the remote REST resource service
//! - [`ISnapshotStore`] - durable per-user snapshot storage
//! - [`IMutationQueue`] - durable per-user mutation log
//! - [`IConnectivityMonitor`] - the online/offline signal

pub mod connectivity;
pub mod mutation_queue;
pub mod resource_service;
pub mod snapshot_store;

pub use connectivity::IConnectivityMonitor;
pub use mutation_queue::{IMutationQueue, QueuedMutation};
pub use resource_service::{IResourceService, ServiceError};
pub use snapshot_store::ISnapshotStore;
