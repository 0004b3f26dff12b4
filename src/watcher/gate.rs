//! Extension filtering and settle delay.

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use super::events::{FileEvent, ReadyFile};
use crate::config::WatchConfig;

/// Outcome of checking an event against the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Event names a file with an allowed extension.
    Accept,
    /// Event names a directory.
    Directory,
    /// Extension missing or not in the allowlist.
    Extension,
}

/// Filters creation events and holds accepted files for the settle delay.
///
/// The delay gives a writer time to finish; it is a heuristic, not a
/// guarantee that the file is complete.
#[derive(Debug, Clone)]
pub struct DebounceGate {
    settle_delay: Duration,
    extensions: Arc<BTreeSet<String>>,
}

impl DebounceGate {
    /// Create a gate from a watch config.
    #[must_use]
    pub fn new(config: &WatchConfig) -> Self {
        Self {
            settle_delay: config.settle_delay(),
            extensions: Arc::new(config.extensions().clone()),
        }
    }

    /// Check whether an event should be acted on.
    #[must_use]
    pub fn check(&self, event: &FileEvent) -> Verdict {
        if event.is_directory {
            return Verdict::Directory;
        }

        match event.extension() {
            Some(ext) if self.extensions.contains(&ext) => Verdict::Accept,
            _ => Verdict::Extension,
        }
    }

    /// Whether an event passes the filter.
    #[must_use]
    pub fn accepts(&self, event: &FileEvent) -> bool {
        self.check(event) == Verdict::Accept
    }

    /// Wait out the settle delay for an accepted event.
    ///
    /// The returned future owns everything it needs, so it can be spawned.
    /// A zero delay resolves without suspending.
    pub fn settle(&self, event: FileEvent) -> impl Future<Output = ReadyFile> + Send + 'static {
        let delay = self.settle_delay;
        async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            ReadyFile::from_event(event)
        }
    }

    /// Configured settle delay.
    #[must_use]
    pub const fn settle_delay(&self) -> Duration {
        self.settle_delay
    }
}
