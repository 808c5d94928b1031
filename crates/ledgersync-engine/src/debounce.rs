//! Debounced snapshot persistence
//!
//! Offline mutation bursts would otherwise trigger one durable snapshot
//! write per keystroke-level edit. The [`SnapshotDebouncer`] coalesces
//! them: every mutation-path write calls [`touch`](SnapshotDebouncer::touch),
//! and the driver loop polls [`take_if_settled`](SnapshotDebouncer::take_if_settled)
//! until the state has been quiet for the configured window, at which
//! point exactly one save is flushed.
//!
//! This bounds write amplification only — correctness never depends on
//! it, because the in-memory collections are the system of record and
//! the snapshot store is a durability shadow.

use std::time::{Duration, Instant};

/// Quiet-window coalescing for snapshot save requests
#[derive(Debug)]
pub struct SnapshotDebouncer {
    /// How long the state must be quiet before a save is due
    delay: Duration,
    /// When the most recent save request arrived (`None` = clean)
    last_touch: Option<Instant>,
}

impl SnapshotDebouncer {
    /// Creates a debouncer with the given quiet window
    ///
    /// A zero delay makes every pending save due immediately, which
    /// tests use for determinism.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_touch: None,
        }
    }

    /// Records a save request, restarting the quiet window
    pub fn touch(&mut self) {
        self.last_touch = Some(Instant::now());
    }

    /// Returns true if a save has been requested and not yet flushed
    pub fn is_dirty(&self) -> bool {
        self.last_touch.is_some()
    }

    /// Consumes the pending request if its quiet window has elapsed
    ///
    /// Returns true exactly once per settled burst; the caller performs
    /// the actual save.
    pub fn take_if_settled(&mut self) -> bool {
        match self.last_touch {
            Some(at) if at.elapsed() >= self.delay => {
                self.last_touch = None;
                true
            }
            _ => false,
        }
    }

    /// Consumes any pending request regardless of the window (shutdown)
    pub fn take(&mut self) -> bool {
        self.last_touch.take().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_debouncer_has_nothing_to_flush() {
        let mut debouncer = SnapshotDebouncer::new(Duration::from_millis(50));
        assert!(!debouncer.is_dirty());
        assert!(!debouncer.take_if_settled());
    }

    #[test]
    fn test_zero_delay_settles_immediately() {
        let mut debouncer = SnapshotDebouncer::new(Duration::ZERO);
        debouncer.touch();
        assert!(debouncer.is_dirty());
        assert!(debouncer.take_if_settled());
        // consumed
        assert!(!debouncer.is_dirty());
        assert!(!debouncer.take_if_settled());
    }

    #[test]
    fn test_burst_coalesces_into_one_flush() {
        let mut debouncer = SnapshotDebouncer::new(Duration::ZERO);
        debouncer.touch();
        debouncer.touch();
        debouncer.touch();
        assert!(debouncer.take_if_settled());
        assert!(!debouncer.take_if_settled());
    }

    #[test]
    fn test_not_settled_within_window() {
        let mut debouncer = SnapshotDebouncer::new(Duration::from_secs(60));
        debouncer.touch();
        assert!(debouncer.is_dirty());
        assert!(!debouncer.take_if_settled());
        // still pending for a later poll
        assert!(debouncer.is_dirty());
    }

    #[test]
    fn test_take_ignores_window() {
        let mut debouncer = SnapshotDebouncer::new(Duration::from_secs(60));
        debouncer.touch();
        assert!(debouncer.take());
        assert!(!debouncer.take());
    }

    #[test]
    fn test_settles_after_window_elapses() {
        let mut debouncer = SnapshotDebouncer::new(Duration::from_millis(10));
        debouncer.touch();
        std::thread::sleep(Duration::from_millis(20));
        assert!(debouncer.take_if_settled());
    }
}
