//! Error types and Result aliases for hotfolder.
//!
//! This module defines the error hierarchy used throughout the crate.
//! All public functions return `Result<T, Error>` or `Result<T>`.

use thiserror::Error;

use crate::session::SessionState;

/// Result type alias using hotfolder's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for hotfolder operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Runtime configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Rejected watch configuration value.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A watch session could not be started.
    #[error("watch error: {0}")]
    WatchInit(#[from] WatchInitError),

    /// The default handler failed to open a file.
    #[error("launch error: {0}")]
    Launch(#[from] LaunchError),

    /// Another instance holds the instance lock.
    #[error("{0}")]
    AlreadyRunning(#[from] AlreadyRunningError),

    /// Session lifecycle error.
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// Settings file could not be read or written.
    #[error("settings error: {0}")]
    Settings(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Invalid watch configuration values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Settle delay is negative, NaN, infinite or too large.
    #[error("invalid delay value '{value}': {reason}")]
    InvalidDelay { value: String, reason: String },

    /// Watch directory path is empty.
    #[error("watch directory cannot be empty")]
    EmptyDirectory,

    /// Extension allowlist has no entries.
    #[error("extension allowlist cannot be empty")]
    EmptyAllowlist,

    /// Extension contains a path separator or is blank.
    #[error("invalid extension '{0}'")]
    InvalidExtension(String),
}

/// Failure to start watching a directory.
#[derive(Error, Debug)]
pub enum WatchInitError {
    /// Directory does not exist.
    #[error("directory '{path}' does not exist")]
    NotFound { path: String },

    /// Path exists but is not a directory.
    #[error("'{path}' is not a directory")]
    NotADirectory { path: String },

    /// The platform watch facility refused the path.
    #[error("failed to watch '{path}': {reason}")]
    WatchFailed { path: String, reason: String },
}

/// Failure to open a file with its handler.
#[derive(Error, Debug)]
pub enum LaunchError {
    /// The handler program could not be spawned.
    #[error("failed to run '{program}' for '{path}': {reason}")]
    Spawn {
        program: String,
        path: String,
        reason: String,
    },

    /// The handler was started but could not be waited on.
    #[error("lost track of '{program}' for '{path}': {reason}")]
    Wait {
        program: String,
        path: String,
        reason: String,
    },

    /// The handler program exited unsuccessfully.
    #[error("'{program}' exited with {status} for '{path}'")]
    ExitStatus {
        program: String,
        path: String,
        status: String,
    },
}

/// Another instance already holds the instance lock.
#[derive(Error, Debug)]
#[error("another instance is already running (lock {address} is held)")]
pub struct AlreadyRunningError {
    /// Address of the held lock.
    pub address: String,
}

/// Session state machine errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Operation not allowed from the current state.
    #[error("cannot {action} while {from}")]
    InvalidTransition {
        from: SessionState,
        action: &'static str,
    },

    /// The session has already been stopped and cannot be restarted.
    #[error("session has finished; create a new session")]
    Finished,

    /// Operation requires the instance lock.
    #[error("instance lock has not been acquired")]
    LockNotHeld,
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a settings error.
    pub fn settings(msg: impl Into<String>) -> Self {
        Self::Settings(msg.into())
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl ValidationError {
    /// Create an invalid-delay error.
    pub fn delay(value: impl ToString, reason: impl Into<String>) -> Self {
        Self::InvalidDelay {
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

impl WatchInitError {
    /// Path the error refers to.
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::NotFound { path }
            | Self::NotADirectory { path }
            | Self::WatchFailed { path, .. } => path,
        }
    }
}

#[cfg(test)]
mod tests;
