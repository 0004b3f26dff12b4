//! Opening ready files with an external handler.

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use crate::error::LaunchError;

/// Opens a file with some external application.
///
/// `launch` hands the file over and returns once the handler has started.
/// It must not wait for the handler to exit: a player can stay open for as
/// long as the operator watches, and sessions cannot stop while a launch is
/// being handed off.
pub trait Launcher: Send + Sync {
    /// Start the handler for `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the handler cannot be started.
    fn launch(&self, path: &Path) -> Result<LaunchHandle, LaunchError>;
}

/// A handler started by a [`Launcher`].
///
/// Dropping the handle leaves the handler running; [`LaunchHandle::wait`]
/// reports how it exited.
#[derive(Debug)]
pub struct LaunchHandle {
    child: Option<Child>,
    program: String,
    path: PathBuf,
}

impl LaunchHandle {
    /// Handle for a launch with nothing left to wait on.
    #[must_use]
    pub fn detached() -> Self {
        Self {
            child: None,
            program: String::new(),
            path: PathBuf::new(),
        }
    }

    /// Handle for a spawned handler process.
    #[must_use]
    pub fn child(child: Child, program: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            child: Some(child),
            program: program.into(),
            path: path.into(),
        }
    }

    /// Whether there is a process to wait for.
    #[must_use]
    pub const fn is_detached(&self) -> bool {
        self.child.is_none()
    }

    /// Block until the handler exits.
    ///
    /// # Errors
    ///
    /// Returns [`LaunchError::ExitStatus`] if the handler exited
    /// unsuccessfully, or [`LaunchError::Wait`] if its status is unavailable.
    pub fn wait(self) -> Result<(), LaunchError> {
        let Some(mut child) = self.child else {
            return Ok(());
        };

        let status = child.wait().map_err(|e| LaunchError::Wait {
            program: self.program.clone(),
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })?;

        if status.success() {
            tracing::debug!(program = %self.program, path = %self.path.display(), "Handler exited");
            Ok(())
        } else {
            Err(LaunchError::ExitStatus {
                program: self.program,
                path: self.path.display().to_string(),
                status: status.to_string(),
            })
        }
    }
}

/// Runs `program [args..] <path>` without waiting for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLauncher {
    program: String,
    args: Vec<String>,
}

impl CommandLauncher {
    /// Launcher for `program` with no extra arguments.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Add an argument placed before the file path.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Program that will be run.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments placed before the file path.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl Launcher for CommandLauncher {
    fn launch(&self, path: &Path) -> Result<LaunchHandle, LaunchError> {
        let child = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| LaunchError::Spawn {
                program: self.program.clone(),
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        tracing::debug!(program = %self.program, pid = child.id(), "Handler started");
        Ok(LaunchHandle::child(child, &self.program, path))
    }
}

/// The operating system's default handler for a file type.
#[derive(Debug, Clone)]
pub struct SystemLauncher {
    command: CommandLauncher,
}

impl Default for SystemLauncher {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemLauncher {
    /// Select the default-handler command for the current platform.
    #[must_use]
    pub fn new() -> Self {
        #[cfg(target_os = "windows")]
        let command = CommandLauncher::new("cmd").arg("/C").arg("start").arg("");

        #[cfg(target_os = "macos")]
        let command = CommandLauncher::new("open");

        #[cfg(not(any(target_os = "windows", target_os = "macos")))]
        let command = CommandLauncher::new("xdg-open");

        Self { command }
    }

    /// Underlying command.
    #[must_use]
    pub const fn command(&self) -> &CommandLauncher {
        &self.command
    }
}

impl Launcher for SystemLauncher {
    fn launch(&self, path: &Path) -> Result<LaunchHandle, LaunchError> {
        self.command.launch(path)
    }
}
