//! LedgerSync Engine - Offline-first reconciliation
//!
//! The [`ReconciliationEngine`] is the orchestrator at the center of the
//! design: it applies mutations to in-memory state immediately
//! (optimistic), persists them either directly to the remote service
//! (online) or to the durable mutation queue (offline), and on the
//! offline→online transition replays the queue in order followed by one
//! authoritative refetch.
//!
//! ## Supporting components
//!
//! - [`ConnectivityMonitor`] - turns raw platform up/down events into a
//!   stable online signal with hysteresis against flapping links
//! - [`SnapshotDebouncer`] - coalesces bursts of offline edits into a
//!   single persisted snapshot write
//! - [`SyncDriver`] - event loop wiring the monitor and the debouncer to
//!   the engine

pub mod debounce;
pub mod driver;
pub mod engine;
pub mod monitor;

pub use debounce::SnapshotDebouncer;
pub use driver::SyncDriver;
pub use engine::{EngineError, EngineStatus, ReconciliationEngine, ReplayReport};
pub use monitor::{ConnectivityMonitor, ConnectivitySignal};
