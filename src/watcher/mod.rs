//! Directory watching and settle handling.
//!
//! This module provides:
//! - Event sources over notify-rs or an in-process channel
//! - Extension and directory filtering
//! - The per-file settle delay

mod events;
mod gate;
mod source;

pub use events::{FileEvent, ReadyFile};
pub use gate::{DebounceGate, Verdict};
pub use source::{check_directory, ChannelSource, EventSource, FileEventSender, NotifySource};
