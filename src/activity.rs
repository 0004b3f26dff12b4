//! Activity log shared between sessions and the presentation layer.
//!
//! The log is append-only: entries are never edited or removed one by one.
//! `clear` is the only way to drop entries and it resets everything,
//! including the detection counter.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Local};
use parking_lot::Mutex;
use tokio::sync::broadcast;

/// Capacity of the subscriber broadcast buffer.
const SUBSCRIBER_CAPACITY: usize = 256;

/// Kind of activity recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogKind {
    /// A matching file was detected.
    Detection,
    /// Monitoring status changed.
    StatusChange,
    /// The handler failed to open a file.
    LaunchFailure,
}

/// One activity log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Local time the entry was appended.
    pub timestamp: DateTime<Local>,
    /// File name for detections, free text otherwise.
    pub message: String,
    /// What the entry records.
    pub kind: LogKind,
}

impl LogEntry {
    /// Create an entry stamped with the current local time.
    pub fn new(kind: LogKind, message: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now(),
            message: message.into(),
            kind,
        }
    }

    /// Detection entry for a file name.
    pub fn detection(name: impl Into<String>) -> Self {
        Self::new(LogKind::Detection, name)
    }

    /// Status change entry.
    pub fn status(message: impl Into<String>) -> Self {
        Self::new(LogKind::StatusChange, message)
    }

    /// Launch failure entry.
    pub fn launch_failure(message: impl Into<String>) -> Self {
        Self::new(LogKind::LaunchFailure, message)
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.message
        )
    }
}

#[derive(Debug, Default)]
struct Inner {
    entries: Vec<LogEntry>,
    detections: usize,
}

/// Ordered, append-only activity record.
///
/// Cloning yields another handle to the same log.
#[derive(Debug, Clone)]
pub struct ActivityLog {
    inner: Arc<Mutex<Inner>>,
    tx: broadcast::Sender<LogEntry>,
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new()
    }
}

impl ActivityLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(SUBSCRIBER_CAPACITY);
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            tx,
        }
    }

    /// Append an entry and notify subscribers.
    pub fn append(&self, entry: LogEntry) {
        let mut inner = self.inner.lock();
        if entry.kind == LogKind::Detection {
            inner.detections += 1;
        }
        inner.entries.push(entry.clone());
        // Send under the lock so subscribers observe append order.
        let _ = self.tx.send(entry);
    }

    /// Drop every entry and reset the detection counter.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.detections = 0;
    }

    /// Snapshot of all entries in append order.
    #[must_use]
    pub fn entries(&self) -> Vec<LogEntry> {
        self.inner.lock().entries.clone()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Whether the log has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    /// Number of detection entries since the last clear.
    #[must_use]
    pub fn detection_count(&self) -> usize {
        self.inner.lock().detections
    }

    /// Receive entries appended from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<LogEntry> {
        self.tx.subscribe()
    }
}
