//! Watch session lifecycle.
//!
//! This module provides:
//! - `WatchSession`, the per-directory pipeline and its state machine
//! - `SessionManager`, which swaps sessions on reconfiguration
//! - `InstanceLock`, the single-instance guarantee

mod lock;
mod manager;
mod state;
mod stats;
mod watch;

pub use lock::InstanceLock;
pub use manager::{SessionManager, SourceFactory};
pub use state::SessionState;
pub use stats::{SessionStats, SessionStatsSnapshot};
pub use watch::WatchSession;
