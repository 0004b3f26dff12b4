//! Per-session counters.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Statistics for one watch session.
#[derive(Debug, Default)]
pub struct SessionStats {
    pub events_seen: AtomicU64,
    pub files_ignored: AtomicU64,
    pub files_detected: AtomicU64,
    pub files_launched: AtomicU64,
    pub launches_skipped: AtomicU64,
    pub launch_failures: AtomicU64,
}

impl SessionStats {
    /// Create new stats tracker.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Get snapshot of current stats.
    #[must_use]
    pub fn snapshot(&self) -> SessionStatsSnapshot {
        SessionStatsSnapshot {
            events_seen: self.events_seen.load(Ordering::Relaxed),
            files_ignored: self.files_ignored.load(Ordering::Relaxed),
            files_detected: self.files_detected.load(Ordering::Relaxed),
            files_launched: self.files_launched.load(Ordering::Relaxed),
            launches_skipped: self.launches_skipped.load(Ordering::Relaxed),
            launch_failures: self.launch_failures.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Snapshot of session stats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStatsSnapshot {
    pub events_seen: u64,
    pub files_ignored: u64,
    pub files_detected: u64,
    pub files_launched: u64,
    pub launches_skipped: u64,
    pub launch_failures: u64,
}
