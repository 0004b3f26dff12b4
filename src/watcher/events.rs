//! File system event types.

#![allow(clippy::missing_const_for_fn)]

use std::path::{Path, PathBuf};
use std::time::Instant;

/// Raw creation notification from an event source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEvent {
    /// Created path.
    pub path: PathBuf,
    /// When the notification was received.
    pub detected_at: Instant,
    /// Whether the created entry is a directory.
    pub is_directory: bool,
}

impl FileEvent {
    /// Create an event stamped now.
    pub fn new(path: impl Into<PathBuf>, is_directory: bool) -> Self {
        Self {
            path: path.into(),
            detected_at: Instant::now(),
            is_directory,
        }
    }

    /// Event for a plain file.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::new(path, false)
    }

    /// Event for a directory.
    pub fn directory(path: impl Into<PathBuf>) -> Self {
        Self::new(path, true)
    }

    /// Lowercase extension of the path, if any.
    #[must_use]
    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
    }

    /// Final path component for display.
    #[must_use]
    pub fn file_name(&self) -> String {
        display_name(&self.path)
    }
}

/// A file whose settle delay has elapsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadyFile {
    /// Full path.
    pub path: PathBuf,
    /// File name for display.
    pub name: String,
    /// When the settle delay elapsed.
    pub ready_at: Instant,
}

impl ReadyFile {
    /// Mark an event's file as ready now.
    #[must_use]
    pub fn from_event(event: FileEvent) -> Self {
        let name = display_name(&event.path);
        Self {
            path: event.path,
            name,
            ready_at: Instant::now(),
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |n| n.to_string_lossy().into_owned(),
    )
}
