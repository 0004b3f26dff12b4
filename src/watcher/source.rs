//! Directory event sources.
//!
//! [`NotifySource`] wraps the platform watch facility through notify-rs.
//! [`ChannelSource`] is fed in-process through a [`FileEventSender`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::event::{CreateKind, ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::events::FileEvent;
use crate::error::WatchInitError;

/// Buffered notifications per source.
const EVENT_BUFFER: usize = 100;

/// Producer of file-creation notifications for one directory.
pub trait EventSource: Send {
    /// Begin watching `directory` (non-recursively).
    ///
    /// # Errors
    ///
    /// Returns an error if the directory is missing, not a directory, or
    /// cannot be watched.
    fn start(&mut self, directory: &Path) -> Result<mpsc::Receiver<FileEvent>, WatchInitError>;

    /// Release the watch. Safe to call repeatedly.
    fn stop(&mut self);

    /// Whether a watch is currently held.
    fn is_active(&self) -> bool;
}

/// Check that `directory` exists and is a directory.
///
/// # Errors
///
/// Returns [`WatchInitError::NotFound`] or [`WatchInitError::NotADirectory`].
pub fn check_directory(directory: &Path) -> Result<(), WatchInitError> {
    let path = directory.display().to_string();
    match std::fs::metadata(directory) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(WatchInitError::NotADirectory { path }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(WatchInitError::NotFound { path })
        }
        Err(e) => Err(WatchInitError::WatchFailed {
            path,
            reason: e.to_string(),
        }),
    }
}

/// Event source backed by the platform's native watcher.
#[derive(Default)]
pub struct NotifySource {
    watcher: Option<RecommendedWatcher>,
    directory: Option<PathBuf>,
}

impl NotifySource {
    /// Create an idle source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventSource for NotifySource {
    fn start(&mut self, directory: &Path) -> Result<mpsc::Receiver<FileEvent>, WatchInitError> {
        check_directory(directory)?;
        self.stop();

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let roots = watch_roots(directory);

        let mut watcher = notify::recommended_watcher(
            move |result: std::result::Result<Event, notify::Error>| match result {
                Ok(event) => {
                    for file_event in creation_events(&event, &roots) {
                        if tx.blocking_send(file_event).is_err() {
                            return;
                        }
                    }
                }
                Err(e) => {
                    tracing::error!("Watch error: {:?}", e);
                }
            },
        )
        .map_err(|e| WatchInitError::WatchFailed {
            path: directory.display().to_string(),
            reason: e.to_string(),
        })?;

        watcher
            .watch(directory, RecursiveMode::NonRecursive)
            .map_err(|e| WatchInitError::WatchFailed {
                path: directory.display().to_string(),
                reason: e.to_string(),
            })?;

        tracing::info!(path = %directory.display(), "Watching directory");
        self.watcher = Some(watcher);
        self.directory = Some(directory.to_path_buf());
        Ok(rx)
    }

    fn stop(&mut self) {
        if let Some(mut watcher) = self.watcher.take() {
            if let Some(dir) = self.directory.take() {
                if let Err(e) = watcher.unwatch(&dir) {
                    tracing::debug!(path = %dir.display(), error = %e, "Unwatch failed");
                }
                tracing::info!(path = %dir.display(), "Stopped watching directory");
            }
        }
    }

    fn is_active(&self) -> bool {
        self.watcher.is_some()
    }
}

impl Drop for NotifySource {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Forms of the watched directory that notifications may be reported under.
fn watch_roots(directory: &Path) -> Vec<PathBuf> {
    let mut roots = vec![directory.to_path_buf()];
    if let Ok(canonical) = directory.canonicalize() {
        if canonical != directory {
            roots.push(canonical);
        }
    }
    roots
}

/// Translate a notify event into creation events for direct children of the
/// watched directory.
fn creation_events(event: &Event, roots: &[PathBuf]) -> Vec<FileEvent> {
    let kind_is_dir = match event.kind {
        EventKind::Create(CreateKind::File) => Some(false),
        EventKind::Create(CreateKind::Folder) => Some(true),
        EventKind::Create(_) | EventKind::Modify(ModifyKind::Name(RenameMode::To)) => None,
        _ => return Vec::new(),
    };

    event
        .paths
        .iter()
        .filter(|p| is_direct_child(roots, p))
        .map(|p| FileEvent::new(p.clone(), kind_is_dir.unwrap_or_else(|| p.is_dir())))
        .collect()
}

/// Check if a path sits directly inside any form of the watched directory.
fn is_direct_child(roots: &[PathBuf], path: &Path) -> bool {
    path.parent()
        .is_some_and(|parent| roots.iter().any(|root| parent == root))
}

/// Handle for pushing events into a [`ChannelSource`].
#[derive(Clone, Default)]
pub struct FileEventSender {
    slot: Arc<Mutex<Option<mpsc::Sender<FileEvent>>>>,
}

impl FileEventSender {
    /// Deliver an event to the currently started source.
    ///
    /// Returns `false` if no source is started or its buffer is full.
    pub fn send(&self, event: FileEvent) -> bool {
        self.slot
            .lock()
            .as_ref()
            .is_some_and(|tx| tx.try_send(event).is_ok())
    }

    /// Whether a source is currently started.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.slot.lock().as_ref().is_some_and(|tx| !tx.is_closed())
    }
}

/// Event source fed in-process.
///
/// Clones share one sender slot, so a factory can hand a clone to each new
/// session while a single [`FileEventSender`] keeps feeding whichever
/// session is current.
#[derive(Clone, Default)]
pub struct ChannelSource {
    sender: FileEventSender,
    active: bool,
}

impl ChannelSource {
    /// Create a source and the handle that feeds it.
    #[must_use]
    pub fn new() -> (Self, FileEventSender) {
        let source = Self::default();
        let sender = source.sender.clone();
        (source, sender)
    }
}

impl EventSource for ChannelSource {
    fn start(&mut self, directory: &Path) -> Result<mpsc::Receiver<FileEvent>, WatchInitError> {
        check_directory(directory)?;
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        *self.sender.slot.lock() = Some(tx);
        self.active = true;
        Ok(rx)
    }

    fn stop(&mut self) {
        if self.active {
            self.sender.slot.lock().take();
            self.active = false;
        }
    }

    fn is_active(&self) -> bool {
        self.active
    }
}
