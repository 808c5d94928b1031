//! Sync driver - wires connectivity transitions and snapshot flushes
//!
//! The [`SyncDriver`] owns the engine and runs the cooperative event
//! loop around it:
//!
//! ```text
//! ConnectivityMonitor ──→ watch<bool> ──→ SyncDriver ──→ engine.set_connectivity
//!                                             │
//!                                        poll timer ──→ engine.flush_pending_snapshot
//! ```
//!
//! Transitions are delivered exactly once per edge (the watch channel
//! collapses duplicates and the engine ignores same-state notifications),
//! so queue replay fires once per offline→online edge, not on every
//! observation of the online state.

use std::time::Duration;

use tokio::sync::watch;
use tracing::{info, warn};

use crate::engine::ReconciliationEngine;

/// Event loop driving a [`ReconciliationEngine`]
pub struct SyncDriver {
    engine: ReconciliationEngine,
    connectivity_rx: watch::Receiver<bool>,
    poll_interval: Duration,
}

impl SyncDriver {
    /// Creates a driver
    ///
    /// # Arguments
    /// * `engine` - the engine to drive (already initialized)
    /// * `connectivity_rx` - stable connectivity signal from the monitor
    /// * `poll_interval` - how often to poll the snapshot debouncer
    pub fn new(
        engine: ReconciliationEngine,
        connectivity_rx: watch::Receiver<bool>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            engine,
            connectivity_rx,
            poll_interval,
        }
    }

    /// Read access to the driven engine
    pub fn engine(&self) -> &ReconciliationEngine {
        &self.engine
    }

    /// Mutable access to the driven engine (for issuing intents)
    pub fn engine_mut(&mut self) -> &mut ReconciliationEngine {
        &mut self.engine
    }

    /// Main event loop
    ///
    /// Terminates when the connectivity channel closes (monitor stopped),
    /// flushing any pending snapshot on the way out.
    pub async fn run(&mut self) {
        info!(
            poll_ms = self.poll_interval.as_millis() as u64,
            "Sync driver starting"
        );

        let mut poll_timer = tokio::time::interval(self.poll_interval);

        loop {
            tokio::select! {
                changed = self.connectivity_rx.changed() => {
                    match changed {
                        Ok(()) => {
                            let online = *self.connectivity_rx.borrow_and_update();
                            match self.engine.set_connectivity(online).await {
                                Ok(Some(report)) => {
                                    info!(
                                        replayed = report.replayed,
                                        failed = report.failed,
                                        "Reconnect reconciliation finished"
                                    );
                                }
                                Ok(None) => {}
                                Err(err) => {
                                    warn!(error = %err, "Connectivity transition failed");
                                }
                            }
                        }
                        Err(_) => {
                            info!("Connectivity channel closed, sync driver shutting down");
                            break;
                        }
                    }
                }

                _ = poll_timer.tick() => {
                    self.engine.flush_pending_snapshot().await;
                }
            }
        }

        // Don't lose a pending optimistic save on shutdown
        self.engine.flush_now().await;

        info!("Sync driver stopped");
    }

    /// Consumes the driver, returning the engine
    pub fn into_engine(self) -> ReconciliationEngine {
        self.engine
    }
}
