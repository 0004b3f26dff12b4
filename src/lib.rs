//! hotfolder
//!
//! Watches a directory for newly created video files and opens each one in
//! the host's default player after a settle delay. Monitoring can be paused,
//! resumed and pointed at another directory while running.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod activity;
pub mod config;
pub mod console;
pub mod error;
pub mod launcher;
pub mod observability;
pub mod session;
pub mod watcher;

pub use config::{Config, WatchConfig};
pub use error::{Error, Result};
