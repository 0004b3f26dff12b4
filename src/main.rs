//! hotfolder - open new videos from a watched directory
//!
//! Entry point for the headless watcher and its stdin console.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use hotfolder::activity::{ActivityLog, LogEntry, LogKind};
use hotfolder::config::{JsonSettingsStore, SettingsStore, DEFAULT_LOCK_PORT};
use hotfolder::console::{self, Command, Reply};
use hotfolder::launcher::{CommandLauncher, Launcher, SystemLauncher};
use hotfolder::observability::init_tracing;
use hotfolder::session::SessionManager;
use hotfolder::{Config, Error, Result, WatchConfig};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio::sync::broadcast;

/// hotfolder - open new videos from a watched directory
#[derive(Parser, Debug)]
#[command(name = "hotfolder")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Settings file (JSON)
    #[arg(
        short,
        long,
        env = "HOTFOLDER_SETTINGS",
        default_value = "video_player_config.json"
    )]
    settings: PathBuf,

    /// Directory to watch (overrides the settings file)
    #[arg(short, long, env = "HOTFOLDER_FOLDER")]
    folder: Option<PathBuf>,

    /// Settle delay in seconds (overrides the settings file)
    #[arg(short, long, env = "HOTFOLDER_DELAY")]
    delay: Option<f64>,

    /// Extensions to open, comma separated (overrides the settings file)
    #[arg(short, long, env = "HOTFOLDER_EXTENSIONS", value_delimiter = ',')]
    extensions: Vec<String>,

    /// Loopback port held as the single-instance lock
    #[arg(long, env = "HOTFOLDER_LOCK_PORT", default_value_t = DEFAULT_LOCK_PORT)]
    lock_port: u16,

    /// Program to open videos with instead of the system default
    #[arg(long, env = "HOTFOLDER_PLAYER")]
    player: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "HOTFOLDER_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Enable JSON logging output
    #[arg(long, env = "HOTFOLDER_LOG_JSON")]
    log_json: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(&cli.log_level, cli.log_json);

    tracing::info!("hotfolder v{} starting...", env!("CARGO_PKG_VERSION"));

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(Error::AlreadyRunning(e)) => {
            eprintln!("hotfolder: {e}");
            ExitCode::from(1)
        }
        Err(e) => {
            tracing::error!(error = %e, "Fatal error");
            eprintln!("hotfolder: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config {
        settings_path: cli.settings.clone(),
        log_level: cli.log_level.clone(),
        lock_port: cli.lock_port,
        player: cli.player.clone(),
    };

    tracing::debug!(?config, "Configuration loaded");

    config.validate()?;

    let store = Arc::new(JsonSettingsStore::new(&config.settings_path));
    let watch_config = initial_watch_config(&cli, store.as_ref())?;

    let launcher: Arc<dyn Launcher> = match config.player {
        Some(ref program) => Arc::new(CommandLauncher::new(program.trim())),
        None => Arc::new(SystemLauncher::new()),
    };

    let log = ActivityLog::new();
    let mut manager = SessionManager::new(watch_config.clone(), store)
        .with_launcher(launcher)
        .with_log(log.clone())
        .with_lock_addr(config.lock_addr());

    manager.acquire_instance_lock()?;

    let printer = tokio::spawn(print_activity(log.clone(), log.subscribe()));

    if let Err(e) = manager.start(watch_config).await {
        println!("Could not start monitoring: {e}");
        println!("Use 'folder <path>' to pick another directory.");
    }
    println!("Type 'help' for commands.");

    console_loop(&mut manager).await;

    let result = manager.shutdown().await;
    printer.abort();
    result
}

/// Persisted settings with command line overrides applied.
fn initial_watch_config(cli: &Cli, store: &dyn SettingsStore) -> Result<WatchConfig> {
    let settings = store.load()?;

    let mut config = match settings.to_watch_config() {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring invalid stored settings");
            WatchConfig::new(&settings.hot_folder)?
        }
    };

    if let Some(ref folder) = cli.folder {
        config = config.with_directory(folder)?;
    }
    if let Some(secs) = cli.delay {
        config = config.with_delay_secs(secs)?;
    }
    if !cli.extensions.is_empty() {
        config = config.with_extensions(&cli.extensions)?;
    }

    Ok(config)
}

/// Echo activity entries to stdout as they arrive.
async fn print_activity(log: ActivityLog, mut entries: broadcast::Receiver<LogEntry>) {
    loop {
        match entries.recv().await {
            Ok(entry) => {
                println!("{entry}");
                if entry.kind == LogKind::Detection {
                    println!("Videos Detected: {}", log.detection_count());
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Activity printer lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Read commands until `quit` or a shutdown signal.
///
/// Closed stdin is not a quit request; the watcher keeps running until a
/// signal arrives.
async fn console_loop(manager: &mut SessionManager) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        let line = tokio::select! {
            () = &mut shutdown => break,
            line = lines.next_line(), if stdin_open => line,
        };

        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => {
                tracing::debug!("Console input closed");
                stdin_open = false;
                continue;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read console input");
                stdin_open = false;
                continue;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };

        match console::apply(manager, command).await {
            Ok(Reply::Continue(message)) => println!("{message}"),
            Ok(Reply::Quit) => break,
            Err(e) => println!("Error: {e}"),
        }
    }
}

/// Wait for shutdown signal (SIGTERM or Ctrl+C).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }
}
