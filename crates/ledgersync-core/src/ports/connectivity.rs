//! Connectivity monitor port (driven/secondary port)
//!
//! The engine consumes connectivity as an explicit injected interface
//! rather than a global mutable flag, so its behavior under both states
//! is testable without simulating real network events. The concrete
//! monitor (in `ledgersync-engine`) feeds on platform up/down events and
//! applies hysteresis before reporting an offline→online transition.

/// Port trait for the online/offline signal
pub trait IConnectivityMonitor: Send + Sync {
    /// Current stable connectivity as last reported by the platform
    fn is_online(&self) -> bool;
}
