//! Runtime configuration and validation.

use crate::{Error, Result};
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

/// Loopback port claimed as the instance lock.
pub const DEFAULT_LOCK_PORT: u16 = 47613;

/// Process-level configuration for the hotfolder binary.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path of the persisted settings file.
    pub settings_path: PathBuf,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Loopback port bound as the single-instance lock.
    pub lock_port: u16,

    /// Program used instead of the platform default handler.
    pub player: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            settings_path: PathBuf::from("video_player_config.json"),
            log_level: "info".to_string(),
            lock_port: DEFAULT_LOCK_PORT,
            player: None,
        }
    }
}

impl Config {
    /// Create a new configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<()> {
        if self.lock_port == 0 {
            return Err(Error::config("lock port cannot be 0"));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(Error::config(format!(
                "invalid log level '{}', must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            )));
        }

        if self.settings_path.as_os_str().is_empty() {
            return Err(Error::config("settings path cannot be empty"));
        }

        if self.player.as_deref().is_some_and(|p| p.trim().is_empty()) {
            return Err(Error::config("player cannot be blank"));
        }

        Ok(())
    }

    /// Address bound by the instance lock.
    #[must_use]
    pub fn lock_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::LOCALHOST, self.lock_port))
    }
}
