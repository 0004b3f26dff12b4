//! Line-based operator commands.

use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

use crate::session::{SessionManager, SessionState};
use crate::Result;

/// Help text listing the console commands.
pub const HELP: &str = "\
commands:
  pause            stop opening new videos (detection continues)
  resume           start opening new videos again
  toggle           pause when running, resume when paused
  folder <path>    watch a different directory
  delay <seconds>  change the settle delay
  status           show state, folder and delay
  log              print the activity log
  clear            clear the activity log
  help             show this text
  quit             shut down";

/// A parsed console command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `pause`: stop opening files.
    Pause,
    /// `resume` or `start`: open files again.
    Resume,
    /// `toggle`: flip between running and paused.
    Toggle,
    /// `folder <path>`: watch another directory.
    Folder(PathBuf),
    /// `delay <seconds>`: change the settle delay.
    Delay(f64),
    /// `status`: one-line summary.
    Status,
    /// `log`: print every activity entry.
    Log,
    /// `clear`: empty the activity log.
    Clear,
    /// `help` or `?`.
    Help,
    /// `quit` or `exit`.
    Quit,
}

/// Console input that could not be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("empty command")]
    Empty,

    #[error("unknown command '{0}' (try 'help')")]
    Unknown(String),

    #[error("'{0}' needs an argument")]
    MissingArgument(&'static str),

    #[error("invalid delay value: '{0}' is not a number")]
    InvalidDelay(String),
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> std::result::Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(w, r)| (w, r.trim()));

        match word.to_lowercase().as_str() {
            "" => Err(CommandError::Empty),
            "pause" => Ok(Self::Pause),
            "resume" | "start" => Ok(Self::Resume),
            "toggle" => Ok(Self::Toggle),
            "status" => Ok(Self::Status),
            "log" => Ok(Self::Log),
            "clear" => Ok(Self::Clear),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" => Ok(Self::Quit),
            "folder" => {
                if rest.is_empty() {
                    Err(CommandError::MissingArgument("folder"))
                } else {
                    Ok(Self::Folder(PathBuf::from(rest)))
                }
            }
            "delay" => {
                if rest.is_empty() {
                    return Err(CommandError::MissingArgument("delay"));
                }
                rest.parse()
                    .map(Self::Delay)
                    .map_err(|_| CommandError::InvalidDelay(rest.to_string()))
            }
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

/// What the console loop should do after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Print the message and keep reading.
    Continue(String),
    /// Shut down.
    Quit,
}

/// Apply a command to the manager and describe the outcome.
///
/// # Errors
///
/// Returns the manager's error when an operation is refused; the caller
/// shows it to the operator and keeps going.
pub async fn apply(manager: &mut SessionManager, command: Command) -> Result<Reply> {
    let message = match command {
        Command::Pause => {
            manager.pause()?;
            "Monitoring paused".to_string()
        }
        Command::Resume => {
            manager.resume()?;
            "Monitoring resumed".to_string()
        }
        Command::Toggle => match manager.toggle_pause()? {
            SessionState::Paused => "Monitoring paused".to_string(),
            _ => "Monitoring resumed".to_string(),
        },
        Command::Folder(path) => {
            manager.set_directory(path).await?;
            format!(
                "Watch folder updated successfully: {}",
                manager.config().directory().display()
            )
        }
        Command::Delay(secs) => {
            manager.set_delay_secs(secs).await?;
            "Delay updated successfully".to_string()
        }
        Command::Status => status_line(manager),
        Command::Log => {
            let entries = manager.log().entries();
            if entries.is_empty() {
                "(log is empty)".to_string()
            } else {
                entries
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("\n")
            }
        }
        Command::Clear => {
            manager.log().clear();
            "Videos Detected: 0".to_string()
        }
        Command::Help => HELP.to_string(),
        Command::Quit => return Ok(Reply::Quit),
    };
    Ok(Reply::Continue(message))
}

fn status_line(manager: &SessionManager) -> String {
    let config = manager.config();
    format!(
        "state: {} | folder: {} | delay: {}s | videos detected: {}",
        manager.state(),
        config.directory().display(),
        config.settle_delay().as_secs_f64(),
        manager.log().detection_count()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!("pause".parse::<Command>(), Ok(Command::Pause));
        assert_eq!("  RESUME ".parse::<Command>(), Ok(Command::Resume));
        assert_eq!("start".parse::<Command>(), Ok(Command::Resume));
        assert_eq!("quit".parse::<Command>(), Ok(Command::Quit));
        assert_eq!("?".parse::<Command>(), Ok(Command::Help));
    }

    #[test]
    fn test_parse_folder_keeps_spaces() {
        assert_eq!(
            "folder /media/My Videos".parse::<Command>(),
            Ok(Command::Folder(PathBuf::from("/media/My Videos")))
        );
        assert_eq!(
            "folder".parse::<Command>(),
            Err(CommandError::MissingArgument("folder"))
        );
    }

    #[test]
    fn test_parse_delay() {
        assert_eq!("delay 2.5".parse::<Command>(), Ok(Command::Delay(2.5)));
        assert_eq!(
            "delay soon".parse::<Command>(),
            Err(CommandError::InvalidDelay("soon".to_string()))
        );
        // Range checks happen in the config layer.
        assert_eq!("delay -1".parse::<Command>(), Ok(Command::Delay(-1.0)));
    }

    #[tokio::test]
    async fn test_apply_drives_manager() {
        use crate::config::MemorySettingsStore;
        use crate::watcher::{ChannelSource, EventSource};
        use crate::WatchConfig;
        use std::net::{Ipv4Addr, TcpListener};
        use std::sync::Arc;

        let tmp = tempfile::TempDir::new().unwrap();
        let addr = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
            .unwrap()
            .local_addr()
            .unwrap();
        let (source, _sender) = ChannelSource::new();
        let mut manager = SessionManager::new(
            WatchConfig::new(tmp.path()).unwrap(),
            Arc::new(MemorySettingsStore::default()),
        )
        .with_source_factory(Arc::new(move || -> Box<dyn EventSource> {
            Box::new(source.clone())
        }))
        .with_lock_addr(addr);
        manager.acquire_instance_lock().unwrap();
        manager
            .start(WatchConfig::new(tmp.path()).unwrap())
            .await
            .unwrap();

        assert_eq!(
            apply(&mut manager, Command::Toggle).await.unwrap(),
            Reply::Continue("Monitoring paused".to_string())
        );
        let Reply::Continue(status) = apply(&mut manager, Command::Status).await.unwrap() else {
            panic!("status should not quit");
        };
        assert!(status.starts_with("state: paused"));

        apply(&mut manager, Command::Delay(1.0)).await.unwrap();
        assert_eq!(manager.config().settle_delay().as_secs_f64(), 1.0);
        assert!(apply(&mut manager, Command::Delay(-1.0)).await.is_err());

        assert_eq!(
            apply(&mut manager, Command::Clear).await.unwrap(),
            Reply::Continue("Videos Detected: 0".to_string())
        );
        assert!(manager.log().is_empty());
        assert_eq!(
            apply(&mut manager, Command::Quit).await.unwrap(),
            Reply::Quit
        );

        manager.shutdown().await.unwrap();
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<Command>(), Err(CommandError::Empty));
        assert!(matches!(
            "dance".parse::<Command>(),
            Err(CommandError::Unknown(_))
        ));
    }
}
