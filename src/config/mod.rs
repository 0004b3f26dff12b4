//! Configuration management for hotfolder.
//!
//! Supports configuration from:
//! - Command-line arguments (highest priority)
//! - Environment variables
//! - Persisted settings file (lowest priority)

mod settings;
mod store;
mod watch;

pub use settings::{Config, DEFAULT_LOCK_PORT};
pub use store::{JsonSettingsStore, MemorySettingsStore, Settings, SettingsStore};
pub use watch::{WatchConfig, DEFAULT_EXTENSIONS, DEFAULT_SETTLE_DELAY};
