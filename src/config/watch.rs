//! Watch configuration captured by each session.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ValidationError;

/// Default settle delay before a detected file is opened.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(5);

/// Video extensions watched when none are configured.
pub const DEFAULT_EXTENSIONS: &[&str] = &["mp4", "avi", "mkv"];

/// Parameters of one watch session.
///
/// Values are validated on construction and cannot be changed afterwards;
/// the builder methods consume `self` and return a new config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchConfig {
    directory: PathBuf,
    settle_delay: Duration,
    extensions: BTreeSet<String>,
}

impl WatchConfig {
    /// Create a config for `directory` with the default delay and allowlist.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory path is empty.
    pub fn new(directory: impl Into<PathBuf>) -> Result<Self, ValidationError> {
        let directory = directory.into();
        if directory.as_os_str().is_empty() {
            return Err(ValidationError::EmptyDirectory);
        }

        Ok(Self {
            directory,
            settle_delay: DEFAULT_SETTLE_DELAY,
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| (*e).to_string()).collect(),
        })
    }

    /// Replace the settle delay, given in seconds.
    ///
    /// # Errors
    ///
    /// Returns an error if `secs` is negative, NaN, infinite or overflows.
    pub fn with_delay_secs(mut self, secs: f64) -> Result<Self, ValidationError> {
        self.settle_delay = parse_delay(secs)?;
        Ok(self)
    }

    /// Replace the settle delay.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Replace the watch directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory path is empty.
    pub fn with_directory(mut self, directory: impl Into<PathBuf>) -> Result<Self, ValidationError> {
        let directory = directory.into();
        if directory.as_os_str().is_empty() {
            return Err(ValidationError::EmptyDirectory);
        }
        self.directory = directory;
        Ok(self)
    }

    /// Replace the extension allowlist.
    ///
    /// Extensions are lowercased and a leading dot is stripped, so `".MP4"`
    /// and `"mp4"` are equivalent.
    ///
    /// # Errors
    ///
    /// Returns an error if the list is empty or an entry is malformed.
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = BTreeSet::new();
        for ext in extensions {
            let raw = ext.as_ref().trim();
            let normalized = raw.trim_start_matches('.').to_lowercase();
            if normalized.is_empty() || normalized.contains(['/', '\\', '.']) {
                return Err(ValidationError::InvalidExtension(raw.to_string()));
            }
            set.insert(normalized);
        }

        if set.is_empty() {
            return Err(ValidationError::EmptyAllowlist);
        }

        self.extensions = set;
        Ok(self)
    }

    /// Watched directory.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Settle delay.
    #[must_use]
    pub const fn settle_delay(&self) -> Duration {
        self.settle_delay
    }

    /// Lowercase extension allowlist.
    #[must_use]
    pub const fn extensions(&self) -> &BTreeSet<String> {
        &self.extensions
    }
}

/// Convert operator input in seconds to a delay.
fn parse_delay(secs: f64) -> Result<Duration, ValidationError> {
    if secs.is_nan() {
        return Err(ValidationError::delay(secs, "not a number"));
    }
    if secs < 0.0 {
        return Err(ValidationError::delay(secs, "delay must be non-negative"));
    }
    Duration::try_from_secs_f64(secs).map_err(|e| ValidationError::delay(secs, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WatchConfig::new("/videos").unwrap();
        assert_eq!(config.directory(), Path::new("/videos"));
        assert_eq!(config.settle_delay(), DEFAULT_SETTLE_DELAY);
        let exts: Vec<_> = config.extensions().iter().map(String::as_str).collect();
        assert_eq!(exts, vec!["avi", "mkv", "mp4"]);
    }

    #[test]
    fn test_empty_directory_rejected() {
        assert_eq!(
            WatchConfig::new("").unwrap_err(),
            ValidationError::EmptyDirectory
        );
    }

    #[test]
    fn test_delay_fractional() {
        let config = WatchConfig::new("/videos")
            .unwrap()
            .with_delay_secs(2.5)
            .unwrap();
        assert_eq!(config.settle_delay(), Duration::from_millis(2500));
    }

    #[test]
    fn test_delay_zero_allowed() {
        let config = WatchConfig::new("/videos")
            .unwrap()
            .with_delay_secs(0.0)
            .unwrap();
        assert_eq!(config.settle_delay(), Duration::ZERO);
    }

    #[test]
    fn test_negative_delay_rejected() {
        let err = WatchConfig::new("/videos")
            .unwrap()
            .with_delay_secs(-1.0)
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidDelay { .. }));
        assert!(err.to_string().contains("non-negative"));
    }

    #[test]
    fn test_nan_and_infinite_delay_rejected() {
        let base = WatchConfig::new("/videos").unwrap();
        assert!(base.clone().with_delay_secs(f64::NAN).is_err());
        assert!(base.with_delay_secs(f64::INFINITY).is_err());
    }

    #[test]
    fn test_extensions_normalized() {
        let config = WatchConfig::new("/videos")
            .unwrap()
            .with_extensions([".MP4", "mov", "Mov"])
            .unwrap();
        let exts: Vec<_> = config.extensions().iter().map(String::as_str).collect();
        assert_eq!(exts, vec!["mov", "mp4"]);
    }

    #[test]
    fn test_extensions_rejected() {
        let base = WatchConfig::new("/videos").unwrap();
        assert_eq!(
            base.clone().with_extensions(Vec::<String>::new()).unwrap_err(),
            ValidationError::EmptyAllowlist
        );
        assert!(matches!(
            base.clone().with_extensions(["tar.gz"]).unwrap_err(),
            ValidationError::InvalidExtension(_)
        ));
        assert!(matches!(
            base.with_extensions([" "]).unwrap_err(),
            ValidationError::InvalidExtension(_)
        ));
    }

    #[test]
    fn test_with_directory_keeps_other_fields() {
        let config = WatchConfig::new("/a")
            .unwrap()
            .with_delay_secs(1.0)
            .unwrap()
            .with_directory("/b")
            .unwrap();
        assert_eq!(config.directory(), Path::new("/b"));
        assert_eq!(config.settle_delay(), Duration::from_secs(1));
    }
}
