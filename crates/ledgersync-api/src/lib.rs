//! LedgerSync API - REST resource service client
//!
//! Implements the `IResourceService` port from `ledgersync-core` against
//! the remote REST backend using `reqwest`. It is a driven (secondary)
//! adapter in the hexagonal architecture.
//!
//! Responsibilities:
//! - Bearer-token authentication headers
//! - JSON (de)serialization of the camelCase wire format
//! - Bounded request timeouts (separate, shorter bound for the health probe)
//! - Classifying failures into the [`ServiceError`] taxonomy the
//!   reconciliation engine routes on (connectivity / auth / not-found /
//!   rejected)
//!
//! [`ServiceError`]: ledgersync_core::ports::ServiceError

pub mod client;

pub use client::ApiClient;
