//! Session lifecycle state.

use std::fmt;

/// Lifecycle state of a watch session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Not watching. Initial and terminal state.
    #[default]
    Stopped,
    /// Watching and opening settled files.
    Running,
    /// Watching and logging, but not opening files.
    Paused,
}

impl SessionState {
    /// Whether the session is watching (running or paused).
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Running | Self::Paused)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Stopped => "stopped",
            Self::Running => "running",
            Self::Paused => "paused",
        };
        f.write_str(name)
    }
}
