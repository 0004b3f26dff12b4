//! Persisted operator settings.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::watch::WatchConfig;
use crate::error::ValidationError;
use crate::{Error, Result};

/// Settings record persisted between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Directory watched for new videos.
    pub hot_folder: PathBuf,

    /// Settle delay in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay_seconds: Option<f64>,

    /// Extension allowlist.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Vec<String>>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            hot_folder: dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")),
            delay_seconds: None,
            extensions: None,
        }
    }
}

impl Settings {
    /// Build a watch config, falling back to defaults for unset fields.
    ///
    /// # Errors
    ///
    /// Returns an error if a stored value fails validation.
    pub fn to_watch_config(&self) -> std::result::Result<WatchConfig, ValidationError> {
        let mut config = WatchConfig::new(&self.hot_folder)?;
        if let Some(secs) = self.delay_seconds {
            config = config.with_delay_secs(secs)?;
        }
        if let Some(ref exts) = self.extensions {
            config = config.with_extensions(exts)?;
        }
        Ok(config)
    }

    /// Capture a watch config for persistence.
    #[must_use]
    pub fn from_watch_config(config: &WatchConfig) -> Self {
        Self {
            hot_folder: config.directory().to_path_buf(),
            delay_seconds: Some(config.settle_delay().as_secs_f64()),
            extensions: Some(config.extensions().iter().cloned().collect()),
        }
    }
}

/// Load/save seam for persisted settings.
pub trait SettingsStore: Send + Sync {
    /// Load settings, returning defaults when nothing usable is stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn load(&self) -> Result<Settings>;

    /// Persist settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn save(&self, settings: &Settings) -> Result<()>;
}

/// Settings stored as a JSON file.
#[derive(Debug, Clone)]
pub struct JsonSettingsStore {
    path: PathBuf,
}

impl JsonSettingsStore {
    /// Create a store backed by `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the settings file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for JsonSettingsStore {
    fn load(&self) -> Result<Settings> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "No settings file, using defaults");
                return Ok(Settings::default());
            }
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str(&contents) {
            Ok(settings) => Ok(settings),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Malformed settings file, using defaults"
                );
                Ok(Settings::default())
            }
        }
    }

    fn save(&self, settings: &Settings) -> Result<()> {
        let json = serde_json::to_string_pretty(settings)
            .map_err(|e| Error::settings(format!("failed to serialize settings: {e}")))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path).map_err(|e| {
            Error::settings(format!(
                "failed to replace '{}': {e}",
                self.path.display()
            ))
        })?;

        tracing::debug!(path = %self.path.display(), "Settings saved");
        Ok(())
    }
}

/// In-memory settings, for embedders that persist elsewhere.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    settings: Mutex<Option<Settings>>,
}

impl MemorySettingsStore {
    /// Create a store holding `settings`.
    #[must_use]
    pub fn with_settings(settings: Settings) -> Self {
        Self {
            settings: Mutex::new(Some(settings)),
        }
    }

    /// Last saved settings, if any.
    #[must_use]
    pub fn snapshot(&self) -> Option<Settings> {
        self.settings.lock().clone()
    }
}

impl SettingsStore for MemorySettingsStore {
    fn load(&self) -> Result<Settings> {
        Ok(self.settings.lock().clone().unwrap_or_default())
    }

    fn save(&self, settings: &Settings) -> Result<()> {
        *self.settings.lock() = Some(settings.clone());
        Ok(())
    }
}
