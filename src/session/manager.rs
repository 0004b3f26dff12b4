//! Owner of the active watch session and the instance lock.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::watch;

use super::lock::InstanceLock;
use super::state::SessionState;
use super::stats::SessionStats;
use super::watch::WatchSession;
use crate::activity::{ActivityLog, LogEntry};
use crate::config::{Settings, SettingsStore, WatchConfig, DEFAULT_LOCK_PORT};
use crate::error::SessionError;
use crate::launcher::{Launcher, SystemLauncher};
use crate::watcher::{EventSource, NotifySource};
use crate::Result;

/// Builds a fresh event source for each new session.
pub type SourceFactory = Arc<dyn Fn() -> Box<dyn EventSource> + Send + Sync>;

/// Coordinates session replacement and process-wide resources.
pub struct SessionManager {
    sources: SourceFactory,
    launcher: Arc<dyn Launcher>,
    log: ActivityLog,
    store: Arc<dyn SettingsStore>,
    lock_addr: SocketAddr,
    lock: Option<InstanceLock>,
    session: Option<WatchSession>,
    config: WatchConfig,
    saved: Option<WatchConfig>,
    state_tx: watch::Sender<SessionState>,
}

impl SessionManager {
    /// Create a manager with the platform watcher and default handler.
    pub fn new(config: WatchConfig, store: Arc<dyn SettingsStore>) -> Self {
        let (state_tx, _) = watch::channel(SessionState::Stopped);
        Self {
            sources: Arc::new(|| -> Box<dyn EventSource> { Box::new(NotifySource::new()) }),
            launcher: Arc::new(SystemLauncher::new()),
            log: ActivityLog::new(),
            store,
            lock_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_LOCK_PORT)),
            lock: None,
            session: None,
            saved: None,
            config,
            state_tx,
        }
    }

    /// Use a different launcher for sessions started from now on.
    #[must_use]
    pub fn with_launcher(mut self, launcher: Arc<dyn Launcher>) -> Self {
        self.launcher = launcher;
        self
    }

    /// Use a different event source factory.
    #[must_use]
    pub fn with_source_factory(mut self, sources: SourceFactory) -> Self {
        self.sources = sources;
        self
    }

    /// Share an existing activity log.
    #[must_use]
    pub fn with_log(mut self, log: ActivityLog) -> Self {
        self.log = log;
        self
    }

    /// Claim the instance lock on `addr` instead of the default port.
    #[must_use]
    pub const fn with_lock_addr(mut self, addr: SocketAddr) -> Self {
        self.lock_addr = addr;
        self
    }

    /// Claim the single-instance lock. Call once before starting.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::AlreadyRunning`] if another instance holds it.
    pub fn acquire_instance_lock(&mut self) -> Result<()> {
        if self.lock.is_none() {
            self.lock = Some(InstanceLock::acquire(self.lock_addr)?);
            tracing::info!(addr = %self.lock_addr, "Instance lock held");
        }
        Ok(())
    }

    /// Whether this manager holds the instance lock.
    #[must_use]
    pub const fn holds_instance_lock(&self) -> bool {
        self.lock.is_some()
    }

    /// Start monitoring with `config`, replacing any active session.
    ///
    /// # Errors
    ///
    /// See [`SessionManager::reconfigure`].
    pub async fn start(&mut self, config: WatchConfig) -> Result<()> {
        self.reconfigure(config).await
    }

    /// Replace the active session with one using `config`.
    ///
    /// The old session is fully stopped first. A paused manager starts the new
    /// session paused. If the new one fails to start the manager is left
    /// stopped; the old session is not restored, and the failed config is
    /// not persisted.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::WatchInit`] if the directory cannot be watched,
    /// or [`SessionError::LockNotHeld`] before the instance lock is acquired.
    pub async fn reconfigure(&mut self, config: WatchConfig) -> Result<()> {
        if self.lock.is_none() {
            return Err(SessionError::LockNotHeld.into());
        }

        let was_paused = self.state() == SessionState::Paused;
        self.stop_session().await;
        self.config = config.clone();

        let mut session = WatchSession::new(
            (self.sources)(),
            Arc::clone(&self.launcher),
            self.log.clone(),
        );

        let started = if was_paused {
            session.start_paused(config.clone())
        } else {
            session.start(config.clone())
        };
        if let Err(e) = started {
            tracing::error!(error = %e, "Failed to start watch session");
            self.log
                .append(LogEntry::status(format!("Monitoring failed: {e}")));
            self.publish(SessionState::Stopped);
            return Err(e);
        }

        self.publish(session.state());
        self.saved = Some(config);
        self.session = Some(session);
        self.persist();
        Ok(())
    }

    /// Watch a different directory, keeping delay and allowlist.
    ///
    /// # Errors
    ///
    /// Returns a validation error without touching the session, or any
    /// error from [`SessionManager::reconfigure`].
    pub async fn set_directory(&mut self, directory: impl Into<PathBuf>) -> Result<()> {
        let config = self.config.clone().with_directory(directory)?;
        self.reconfigure(config).await
    }

    /// Change the settle delay, keeping directory and allowlist.
    ///
    /// # Errors
    ///
    /// Returns a validation error without touching the session, or any
    /// error from [`SessionManager::reconfigure`].
    pub async fn set_delay_secs(&mut self, secs: f64) -> Result<()> {
        let config = self.config.clone().with_delay_secs(secs)?;
        self.reconfigure(config).await
    }

    /// Pause the active session.
    ///
    /// # Errors
    ///
    /// Returns an error if no session is active.
    pub fn pause(&mut self) -> Result<()> {
        self.active_session("pause")?.pause()?;
        self.publish(SessionState::Paused);
        Ok(())
    }

    /// Resume the active session.
    ///
    /// # Errors
    ///
    /// Returns an error if no session is active.
    pub fn resume(&mut self) -> Result<()> {
        self.active_session("resume")?.resume()?;
        self.publish(SessionState::Running);
        Ok(())
    }

    /// Pause when running, resume when paused. Returns the new state.
    ///
    /// # Errors
    ///
    /// Returns an error if no session is active.
    pub fn toggle_pause(&mut self) -> Result<SessionState> {
        match self.state() {
            SessionState::Running => self.pause()?,
            _ => self.resume()?,
        }
        Ok(self.state())
    }

    /// Stop the session, release the lock and persist the last configuration
    /// that started successfully. Nothing is saved if no session ever started.
    ///
    /// Every step runs even if an earlier one fails.
    ///
    /// # Errors
    ///
    /// Returns the first failure; later failures are logged.
    pub async fn shutdown(&mut self) -> Result<()> {
        let mut first_error = None;

        if let Some(mut session) = self.session.take() {
            if let Err(e) = session.stop().await {
                tracing::error!(error = %e, "Failed to stop watch session");
                first_error.get_or_insert(e);
            }
        }
        self.publish(SessionState::Stopped);

        if let Some(lock) = self.lock.take() {
            lock.release();
        }

        if let Some(ref saved) = self.saved {
            if let Err(e) = self.store.save(&Settings::from_watch_config(saved)) {
                tracing::error!(error = %e, "Failed to save settings");
                first_error.get_or_insert(e);
            }
        }

        tracing::info!("Shutdown complete");
        first_error.map_or(Ok(()), Err)
    }

    /// State of the active session, or `Stopped`.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.session
            .as_ref()
            .map_or(SessionState::Stopped, WatchSession::state)
    }

    /// Most recently requested configuration.
    #[must_use]
    pub const fn config(&self) -> &WatchConfig {
        &self.config
    }

    /// Shared activity log.
    #[must_use]
    pub const fn log(&self) -> &ActivityLog {
        &self.log
    }

    /// Counters of the active session.
    #[must_use]
    pub fn stats(&self) -> Option<Arc<SessionStats>> {
        self.session.as_ref().map(WatchSession::stats)
    }

    /// Observe state transitions.
    #[must_use]
    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    fn active_session(&mut self, action: &'static str) -> Result<&mut WatchSession> {
        self.session.as_mut().ok_or_else(|| {
            SessionError::InvalidTransition {
                from: SessionState::Stopped,
                action,
            }
            .into()
        })
    }

    async fn stop_session(&mut self) {
        if let Some(mut session) = self.session.take() {
            if let Err(e) = session.stop().await {
                tracing::warn!(error = %e, "Previous session did not stop cleanly");
            }
            self.publish(SessionState::Stopped);
        }
    }

    fn persist(&self) {
        let Some(ref saved) = self.saved else {
            return;
        };
        if let Err(e) = self.store.save(&Settings::from_watch_config(saved)) {
            tracing::warn!(error = %e, "Failed to save settings");
        }
    }

    fn publish(&self, state: SessionState) {
        self.state_tx.send_replace(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MemorySettingsStore;
    use crate::error::LaunchError;
    use crate::launcher::LaunchHandle;
    use crate::watcher::ChannelSource;
    use crate::Error;
    use std::net::TcpListener;
    use std::path::Path;
    use tempfile::TempDir;

    struct NullLauncher;

    impl Launcher for NullLauncher {
        fn launch(&self, _path: &Path) -> std::result::Result<LaunchHandle, LaunchError> {
            Ok(LaunchHandle::detached())
        }
    }

    fn free_addr() -> SocketAddr {
        let probe = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
        probe.local_addr().unwrap()
    }

    fn manager(dir: &Path, store: Arc<MemorySettingsStore>) -> SessionManager {
        let (source, _sender) = ChannelSource::new();
        SessionManager::new(WatchConfig::new(dir).unwrap(), store)
            .with_launcher(Arc::new(NullLauncher))
            .with_source_factory(Arc::new(move || -> Box<dyn EventSource> {
                Box::new(source.clone())
            }))
            .with_lock_addr(free_addr())
    }

    #[tokio::test]
    async fn test_start_requires_lock() {
        let tmp = TempDir::new().unwrap();
        let mut manager = manager(tmp.path(), Arc::new(MemorySettingsStore::default()));

        let err = manager
            .start(WatchConfig::new(tmp.path()).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Session(SessionError::LockNotHeld)));
    }

    #[tokio::test]
    async fn test_pause_without_session_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let mut manager = manager(tmp.path(), Arc::new(MemorySettingsStore::default()));
        assert!(manager.pause().is_err());
        assert!(manager.toggle_pause().is_err());
    }

    #[tokio::test]
    async fn test_toggle_and_state_subscription() {
        let tmp = TempDir::new().unwrap();
        let mut manager = manager(tmp.path(), Arc::new(MemorySettingsStore::default()));
        let states = manager.subscribe_state();
        manager.acquire_instance_lock().unwrap();
        manager
            .start(WatchConfig::new(tmp.path()).unwrap())
            .await
            .unwrap();
        assert_eq!(*states.borrow(), SessionState::Running);

        assert_eq!(manager.toggle_pause().unwrap(), SessionState::Paused);
        assert_eq!(*states.borrow(), SessionState::Paused);
        assert_eq!(manager.toggle_pause().unwrap(), SessionState::Running);

        manager.shutdown().await.unwrap();
        assert_eq!(*states.borrow(), SessionState::Stopped);
    }

    #[tokio::test]
    async fn test_invalid_delay_leaves_session_untouched() {
        let tmp = TempDir::new().unwrap();
        let mut manager = manager(tmp.path(), Arc::new(MemorySettingsStore::default()));
        manager.acquire_instance_lock().unwrap();
        manager
            .start(WatchConfig::new(tmp.path()).unwrap())
            .await
            .unwrap();
        let entries_before = manager.log().len();

        let err = manager.set_delay_secs(-2.0).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(manager.state(), SessionState::Running);
        assert_eq!(manager.log().len(), entries_before);
        assert_eq!(
            manager.config().settle_delay(),
            crate::config::DEFAULT_SETTLE_DELAY
        );
    }

    #[tokio::test]
    async fn test_bad_directory_leaves_manager_stopped() {
        let tmp = TempDir::new().unwrap();
        let mut manager = manager(tmp.path(), Arc::new(MemorySettingsStore::default()));
        manager.acquire_instance_lock().unwrap();
        manager
            .start(WatchConfig::new(tmp.path()).unwrap())
            .await
            .unwrap();

        let err = manager
            .set_directory(tmp.path().join("missing"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::WatchInit(_)));
        assert_eq!(manager.state(), SessionState::Stopped);
        assert!(manager.stats().is_none());

        manager.set_directory(tmp.path()).await.unwrap();
        assert_eq!(manager.state(), SessionState::Running);
    }

    #[tokio::test]
    async fn test_reconfigure_keeps_pause() {
        let tmp = TempDir::new().unwrap();
        let mut manager = manager(tmp.path(), Arc::new(MemorySettingsStore::default()));
        manager.acquire_instance_lock().unwrap();
        manager
            .start(WatchConfig::new(tmp.path()).unwrap())
            .await
            .unwrap();
        manager.pause().unwrap();

        manager.set_delay_secs(1.0).await.unwrap();
        assert_eq!(manager.state(), SessionState::Paused);
    }

    #[tokio::test]
    async fn test_shutdown_persists_and_releases_lock() {
        let tmp = TempDir::new().unwrap();
        let store = Arc::new(MemorySettingsStore::default());
        let mut manager = manager(tmp.path(), Arc::clone(&store));
        manager.acquire_instance_lock().unwrap();
        manager
            .start(
                WatchConfig::new(tmp.path())
                    .unwrap()
                    .with_delay_secs(0.5)
                    .unwrap(),
            )
            .await
            .unwrap();

        manager.shutdown().await.unwrap();

        assert!(!manager.holds_instance_lock());
        let saved = store.snapshot().unwrap();
        assert_eq!(saved.hot_folder, tmp.path());
        assert_eq!(saved.delay_seconds, Some(0.5));
    }

    #[tokio::test]
    async fn test_shutdown_continues_after_save_failure() {
        struct BrokenStore;

        impl SettingsStore for BrokenStore {
            fn load(&self) -> Result<Settings> {
                Ok(Settings::default())
            }

            fn save(&self, _settings: &Settings) -> Result<()> {
                Err(Error::settings("disk full"))
            }
        }

        let tmp = TempDir::new().unwrap();
        let (source, _sender) = ChannelSource::new();
        let addr = free_addr();
        let mut manager =
            SessionManager::new(WatchConfig::new(tmp.path()).unwrap(), Arc::new(BrokenStore))
                .with_launcher(Arc::new(NullLauncher))
            .with_source_factory(Arc::new(move || -> Box<dyn EventSource> {
                Box::new(source.clone())
            }))
            .with_lock_addr(addr);
        manager.acquire_instance_lock().unwrap();
        manager
            .start(WatchConfig::new(tmp.path()).unwrap())
            .await
            .unwrap();

        let err = manager.shutdown().await.unwrap_err();
        assert!(matches!(err, Error::Settings(_)));
        assert_eq!(manager.state(), SessionState::Stopped);
        assert!(InstanceLock::acquire(addr).is_ok());
    }

    #[tokio::test]
    async fn test_failed_directory_is_not_persisted() {
        let tmp = TempDir::new().unwrap();
        let store = Arc::new(MemorySettingsStore::default());
        let mut manager = manager(tmp.path(), Arc::clone(&store));
        manager.acquire_instance_lock().unwrap();
        manager
            .start(WatchConfig::new(tmp.path()).unwrap())
            .await
            .unwrap();

        let missing = tmp.path().join("missing");
        assert!(manager.set_directory(&missing).await.is_err());
        assert_eq!(manager.config().directory(), missing);

        manager.shutdown().await.unwrap();
        assert_eq!(store.snapshot().unwrap().hot_folder, tmp.path());
    }

    #[tokio::test]
    async fn test_shutdown_without_start_saves_nothing() {
        let tmp = TempDir::new().unwrap();
        let store = Arc::new(MemorySettingsStore::default());
        let mut manager = manager(tmp.path(), Arc::clone(&store));
        manager.acquire_instance_lock().unwrap();

        manager.shutdown().await.unwrap();
        assert!(store.snapshot().is_none());
    }
}
