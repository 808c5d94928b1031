//! Connectivity monitor with hysteresis
//!
//! Turns raw platform connectivity events (up/down notifications from the
//! host environment) into a *stable* online signal:
//!
//! - online→offline propagates immediately — future mutations must take
//!   the durable path as soon as the link is gone;
//! - offline→online is reported only after the link has stayed up for a
//!   configurable stability window, so a flapping link cannot trigger
//!   redundant replay storms.
//!
//! ```text
//! platform events ──→ mpsc::Sender<bool> ──→ ConnectivityMonitor ──→ watch<bool>
//!                                                  │                     │
//!                                             hysteresis          ConnectivitySignal
//! ```
//!
//! The [`ConnectivitySignal`] half is what the engine consumes through
//! the `IConnectivityMonitor` port; the [`SyncDriver`](crate::driver::SyncDriver)
//! watches the same channel for transitions.

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, info};

use ledgersync_core::ports::IConnectivityMonitor;

/// Shared read handle for the stable connectivity signal
#[derive(Debug, Clone)]
pub struct ConnectivitySignal {
    stable_rx: watch::Receiver<bool>,
}

impl ConnectivitySignal {
    /// Returns a watch receiver for observing transitions
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.stable_rx.clone()
    }
}

impl IConnectivityMonitor for ConnectivitySignal {
    fn is_online(&self) -> bool {
        *self.stable_rx.borrow()
    }
}

/// Event loop applying hysteresis to raw connectivity events
pub struct ConnectivityMonitor {
    raw_rx: mpsc::Receiver<bool>,
    stable_tx: watch::Sender<bool>,
    stability: Duration,
}

impl ConnectivityMonitor {
    /// Creates a monitor
    ///
    /// # Arguments
    /// * `initial_online` - connectivity at startup (reported unstabilized)
    /// * `stability` - how long the link must stay up before an
    ///   offline→online transition is reported; zero disables hysteresis
    ///
    /// # Returns
    /// The monitor itself (run it with [`run`](ConnectivityMonitor::run)),
    /// the sender raw platform events are fed into, and the stable signal
    /// handle consumed by the engine and the driver.
    pub fn new(
        initial_online: bool,
        stability: Duration,
    ) -> (Self, mpsc::Sender<bool>, ConnectivitySignal) {
        let (raw_tx, raw_rx) = mpsc::channel(64);
        let (stable_tx, stable_rx) = watch::channel(initial_online);

        info!(
            initial_online,
            stability_ms = stability.as_millis() as u64,
            "Creating connectivity monitor"
        );

        (
            Self {
                raw_rx,
                stable_tx,
                stability,
            },
            raw_tx,
            ConnectivitySignal { stable_rx },
        )
    }

    /// Main event loop
    ///
    /// Terminates when every raw-event sender has been dropped. A pending
    /// online promotion is abandoned the moment an offline event arrives.
    pub async fn run(mut self) {
        info!("Connectivity monitor starting");

        // Deadline at which a pending online candidate is promoted
        let mut promote_at: Option<Instant> = None;

        loop {
            tokio::select! {
                event = self.raw_rx.recv() => {
                    match event {
                        Some(false) => {
                            promote_at = None;
                            if *self.stable_tx.borrow() {
                                info!("Connectivity lost");
                            }
                            self.stable_tx.send_replace(false);
                        }
                        Some(true) => {
                            if *self.stable_tx.borrow() {
                                // already online, nothing to stabilize
                            } else if self.stability.is_zero() {
                                info!("Connectivity restored");
                                self.stable_tx.send_replace(true);
                            } else if promote_at.is_none() {
                                debug!(
                                    stability_ms = self.stability.as_millis() as u64,
                                    "Link up, waiting for stability window"
                                );
                                promote_at = Some(Instant::now() + self.stability);
                            }
                        }
                        None => {
                            info!("Event channel closed, connectivity monitor shutting down");
                            break;
                        }
                    }
                }

                _ = async {
                    match promote_at {
                        Some(deadline) => tokio::time::sleep_until(deadline).await,
                        None => std::future::pending().await,
                    }
                } => {
                    promote_at = None;
                    info!("Connectivity restored (stability window elapsed)");
                    self.stable_tx.send_replace(true);
                }
            }
        }

        info!("Connectivity monitor stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_initial_state_is_reported() {
        let (_monitor, _tx, signal) = ConnectivityMonitor::new(true, Duration::ZERO);
        assert!(signal.is_online());

        let (_monitor, _tx, signal) = ConnectivityMonitor::new(false, Duration::ZERO);
        assert!(!signal.is_online());
    }

    #[tokio::test]
    async fn test_offline_propagates_immediately() {
        let (monitor, tx, signal) = ConnectivityMonitor::new(true, Duration::from_secs(60));
        let handle = tokio::spawn(monitor.run());

        tx.send(false).await.unwrap();
        let mut rx = signal.subscribe();
        rx.wait_for(|online| !online).await.unwrap();
        assert!(!signal.is_online());

        drop(tx);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_online_promoted_without_hysteresis() {
        let (monitor, tx, signal) = ConnectivityMonitor::new(false, Duration::ZERO);
        let handle = tokio::spawn(monitor.run());

        tx.send(true).await.unwrap();
        let mut rx = signal.subscribe();
        rx.wait_for(|online| *online).await.unwrap();
        assert!(signal.is_online());

        drop(tx);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_online_promoted_after_stability_window() {
        let (monitor, tx, signal) = ConnectivityMonitor::new(false, Duration::from_millis(20));
        let handle = tokio::spawn(monitor.run());

        tx.send(true).await.unwrap();
        // not yet promoted
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(!signal.is_online());

        let mut rx = signal.subscribe();
        rx.wait_for(|online| *online).await.unwrap();
        assert!(signal.is_online());

        drop(tx);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_flap_cancels_pending_promotion() {
        let (monitor, tx, signal) = ConnectivityMonitor::new(false, Duration::from_millis(30));
        let handle = tokio::spawn(monitor.run());

        // up, then down again inside the stability window
        tx.send(true).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        tx.send(false).await.unwrap();

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(!signal.is_online());

        drop(tx);
        handle.await.unwrap();
    }
}
