//! LedgerSync Core - Domain logic and business rules
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `Card`, `Account`, `Transaction`, `Budget`
//! - **Mutations** - the typed add/update/delete operations the engine applies
//! - **Snapshot types** - the in-memory collections and their durable form
//! - **Balance derivation** - the deltas a transaction applies to its source
//! - **State machine** - the reconciliation engine's lifecycle states
//! - **Port definitions** - Traits for adapters: `IResourceService`,
//!   `ISnapshotStore`, `IMutationQueue`, `IConnectivityMonitor`
//! - **Views** - pure derived reads for the presentation layer
//!
//! # Architecture
//!
//! This crate follows the hexagonal (ports & adapters) architecture pattern.
//! The domain module contains pure business logic with no external dependencies.
//! Ports define trait interfaces that adapter crates implement. The
//! reconciliation engine (in `ledgersync-engine`) orchestrates domain types
//! through the port interfaces.

pub mod config;
pub mod domain;
pub mod ports;
pub mod views;
