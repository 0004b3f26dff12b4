//! A single watch session bound to one directory.
//!
//! One consumer task reads the event source. Each accepted event gets its own
//! settle task so files detected close together settle independently. When a
//! settle finishes the pause flag is consulted; running sessions hand the file
//! to the launcher on the blocking pool.
//!
//! Stopping cancels every pending settle, waits for the consumer, then closes
//! the launch gate. Closing takes the gate's write lock, which waits for
//! hand-offs already in progress and turns away any still queued, so nothing
//! reaches the launcher once `stop` has returned. Handlers that were started
//! keep running; their exit is watched on a detached thread and never holds
//! up `stop`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use super::state::SessionState;
use super::stats::SessionStats;
use crate::activity::{ActivityLog, LogEntry};
use crate::config::WatchConfig;
use crate::error::{LaunchError, SessionError};
use crate::launcher::{LaunchHandle, Launcher};
use crate::observability::spans;
use crate::watcher::{DebounceGate, EventSource, FileEvent, ReadyFile, Verdict};
use crate::{Error, Result};

/// Watches one directory and opens settled video files.
pub struct WatchSession {
    id: Uuid,
    state: SessionState,
    finished: bool,
    config: Option<WatchConfig>,
    source: Box<dyn EventSource>,
    launcher: Arc<dyn Launcher>,
    log: ActivityLog,
    stats: Arc<SessionStats>,
    paused: Arc<AtomicBool>,
    shutdown: CancellationToken,
    launch_gate: Arc<RwLock<bool>>,
    consumer: Option<JoinHandle<()>>,
}

impl WatchSession {
    /// Create a stopped session.
    #[must_use]
    pub fn new(source: Box<dyn EventSource>, launcher: Arc<dyn Launcher>, log: ActivityLog) -> Self {
        Self {
            id: Uuid::new_v4(),
            state: SessionState::Stopped,
            finished: false,
            config: None,
            source,
            launcher,
            log,
            stats: SessionStats::new(),
            paused: Arc::new(AtomicBool::new(false)),
            shutdown: CancellationToken::new(),
            launch_gate: Arc::new(RwLock::new(true)),
            consumer: None,
        }
    }

    /// Unique session id.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Config captured at start.
    #[must_use]
    pub const fn config(&self) -> Option<&WatchConfig> {
        self.config.as_ref()
    }

    /// Session counters.
    #[must_use]
    pub fn stats(&self) -> Arc<SessionStats> {
        Arc::clone(&self.stats)
    }

    /// Start watching `config.directory()`.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WatchInit`] if the directory cannot be watched, or a
    /// [`SessionError`] if the session is not in its initial state.
    pub fn start(&mut self, config: WatchConfig) -> Result<()> {
        self.begin(config, false)
    }

    /// Start watching in the `Paused` state.
    ///
    /// The pause flag is set before the consumer task exists, so no file
    /// settled by this session is opened until [`WatchSession::resume`].
    ///
    /// # Errors
    ///
    /// Same as [`WatchSession::start`].
    pub fn start_paused(&mut self, config: WatchConfig) -> Result<()> {
        self.begin(config, true)
    }

    fn begin(&mut self, config: WatchConfig, paused: bool) -> Result<()> {
        if self.finished {
            return Err(SessionError::Finished.into());
        }
        if self.state != SessionState::Stopped {
            return Err(SessionError::InvalidTransition {
                from: self.state,
                action: "start",
            }
            .into());
        }

        let events = self.source.start(config.directory())?;
        self.paused.store(paused, Ordering::Release);

        let pipeline = Pipeline {
            gate: DebounceGate::new(&config),
            launcher: Arc::clone(&self.launcher),
            log: self.log.clone(),
            stats: Arc::clone(&self.stats),
            paused: Arc::clone(&self.paused),
            shutdown: self.shutdown.clone(),
            launch_gate: Arc::clone(&self.launch_gate),
        };
        let span = spans::session_span(&self.id, config.directory());
        self.consumer = Some(tokio::spawn(pipeline.run(events).instrument(span)));

        tracing::info!(
            session_id = %self.id,
            directory = %config.directory().display(),
            delay_ms = u64::try_from(config.settle_delay().as_millis()).unwrap_or(u64::MAX),
            paused,
            "Watch session started"
        );
        let suffix = if paused { " (paused)" } else { "" };
        self.log.append(LogEntry::status(format!(
            "Monitoring started: {}{suffix}",
            config.directory().display()
        )));
        self.state = if paused {
            SessionState::Paused
        } else {
            SessionState::Running
        };
        self.config = Some(config);
        Ok(())
    }

    /// Stop opening settled files. Detection continues.
    ///
    /// # Errors
    ///
    /// Returns an error if the session is stopped.
    pub fn pause(&mut self) -> Result<()> {
        match self.state {
            SessionState::Paused => Ok(()),
            SessionState::Running => {
                self.paused.store(true, Ordering::Release);
                self.state = SessionState::Paused;
                self.log.append(LogEntry::status("Monitoring paused"));
                tracing::info!(session_id = %self.id, "Monitoring paused");
                Ok(())
            }
            SessionState::Stopped => Err(SessionError::InvalidTransition {
                from: self.state,
                action: "pause",
            }
            .into()),
        }
    }

    /// Resume opening files that settle from now on.
    ///
    /// # Errors
    ///
    /// Returns an error if the session is stopped.
    pub fn resume(&mut self) -> Result<()> {
        match self.state {
            SessionState::Running => Ok(()),
            SessionState::Paused => {
                self.paused.store(false, Ordering::Release);
                self.state = SessionState::Running;
                self.log.append(LogEntry::status("Monitoring resumed"));
                tracing::info!(session_id = %self.id, "Monitoring resumed");
                Ok(())
            }
            SessionState::Stopped => Err(SessionError::InvalidTransition {
                from: self.state,
                action: "resume",
            }
            .into()),
        }
    }

    /// Stop watching and discard pending files. No-op when stopped.
    ///
    /// Waits for launches being handed off, not for handlers to exit.
    ///
    /// # Errors
    ///
    /// Returns an error if the consumer task panicked. The session is stopped
    /// either way.
    pub async fn stop(&mut self) -> Result<()> {
        if self.state == SessionState::Stopped {
            return Ok(());
        }

        self.shutdown.cancel();
        self.source.stop();

        let mut result = Ok(());
        if let Some(consumer) = self.consumer.take() {
            if let Err(e) = consumer.await {
                tracing::error!(session_id = %self.id, error = %e, "Session consumer failed");
                result = Err(Error::internal(format!("session consumer failed: {e}")));
            }
        }
        *self.launch_gate.write().await = false;

        self.state = SessionState::Stopped;
        self.finished = true;
        self.log.append(LogEntry::status("Monitoring stopped"));
        tracing::info!(session_id = %self.id, "Watch session stopped");
        result
    }
}

impl Drop for WatchSession {
    fn drop(&mut self) {
        self.shutdown.cancel();
        self.source.stop();
    }
}

/// State shared by the consumer task and its settle tasks.
#[derive(Clone)]
struct Pipeline {
    gate: DebounceGate,
    launcher: Arc<dyn Launcher>,
    log: ActivityLog,
    stats: Arc<SessionStats>,
    paused: Arc<AtomicBool>,
    shutdown: CancellationToken,
    launch_gate: Arc<RwLock<bool>>,
}

impl Pipeline {
    async fn run(self, mut events: mpsc::Receiver<FileEvent>) {
        let mut settling = JoinSet::new();

        loop {
            tokio::select! {
                biased;
                () = self.shutdown.cancelled() => break,
                Some(joined) = settling.join_next(), if !settling.is_empty() => reap(joined),
                event = events.recv() => match event {
                    Some(event) => self.admit(event, &mut settling),
                    None => {
                        tracing::debug!("Event stream closed");
                        self.drain(&mut settling).await;
                        break;
                    }
                },
            }
        }

        settling.shutdown().await;
    }

    /// Wait for pending settles after the source ends, unless cancelled.
    async fn drain(&self, settling: &mut JoinSet<()>) {
        loop {
            tokio::select! {
                biased;
                () = self.shutdown.cancelled() => return,
                joined = settling.join_next() => match joined {
                    Some(joined) => reap(joined),
                    None => return,
                },
            }
        }
    }

    fn admit(&self, event: FileEvent, settling: &mut JoinSet<()>) {
        SessionStats::bump(&self.stats.events_seen);

        let verdict = self.gate.check(&event);
        if verdict != Verdict::Accept {
            SessionStats::bump(&self.stats.files_ignored);
            tracing::trace!(path = %event.path.display(), ?verdict, "Ignoring event");
            return;
        }

        SessionStats::bump(&self.stats.files_detected);
        self.log.append(LogEntry::detection(event.file_name()));
        tracing::info!(path = %event.path.display(), "New video detected");

        let settle = self.gate.settle(event);
        let pipeline = self.clone();
        settling.spawn(async move {
            let ready = tokio::select! {
                biased;
                () = pipeline.shutdown.cancelled() => return,
                ready = settle => ready,
            };
            pipeline.dispatch(ready).await;
        });
    }

    async fn dispatch(self, ready: ReadyFile) {
        if self.paused.load(Ordering::Acquire) {
            SessionStats::bump(&self.stats.launches_skipped);
            tracing::info!(path = %ready.path.display(), "Monitoring paused, not opening");
            return;
        }

        let Self {
            launcher,
            log,
            stats,
            launch_gate,
            ..
        } = self;
        let span = spans::launch_span(&ready.path);

        let launch = tokio::task::spawn_blocking(move || {
            let _entered = span.enter();
            let open = launch_gate.blocking_read();
            if !*open {
                tracing::debug!("Session stopped, dropping launch");
                return;
            }

            let launched = launcher.launch(&ready.path);
            drop(open);

            match launched {
                Ok(handle) => {
                    SessionStats::bump(&stats.files_launched);
                    tracing::info!(path = %ready.path.display(), "Opened video");
                    if !handle.is_detached() {
                        watch_exit(handle, ready.name, log, stats);
                    }
                }
                Err(e) => record_failure(&log, &stats, &ready.name, &e),
            }
        });

        if let Err(e) = launch.await {
            reap(Err(e));
        }
    }
}

/// Wait for a handler on its own thread and log an unsuccessful exit.
///
/// Plain threads are not joined at runtime shutdown, so a player left open
/// does not keep the process alive.
fn watch_exit(handle: LaunchHandle, name: String, log: ActivityLog, stats: Arc<SessionStats>) {
    let spawned = std::thread::Builder::new()
        .name("hotfolder-reaper".to_string())
        .spawn(move || {
            if let Err(e) = handle.wait() {
                record_failure(&log, &stats, &name, &e);
            }
        });

    if let Err(e) = spawned {
        tracing::warn!(error = %e, "Failed to watch handler exit");
    }
}

fn record_failure(log: &ActivityLog, stats: &SessionStats, name: &str, error: &LaunchError) {
    SessionStats::bump(&stats.launch_failures);
    tracing::warn!(error = %error, "Failed to open video");
    log.append(LogEntry::launch_failure(format!("Failed to open {name}: {error}")));
}

fn reap(joined: std::result::Result<(), JoinError>) {
    if let Err(e) = joined {
        if e.is_panic() {
            tracing::error!(error = %e, "Pipeline task panicked");
        }
    }
}
