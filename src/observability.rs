//! Structured logging and tracing configuration.
//!
//! Provides setup for observability using the `tracing` crate with:
//! - Structured logging with JSON output option
//! - Configurable log levels
//! - Spans for watch sessions and launches

use tracing_subscriber::{
    filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, Registry,
};

/// Initialize tracing with the given level and output format.
///
/// `RUST_LOG` takes precedence over `level` when set. Output goes to
/// stderr so stdout stays free for the operator console.
///
/// # Panics
///
/// Panics if tracing subscriber has already been initialized in this process.
pub fn init_tracing(level: &str, json: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        let json_layer = fmt::layer()
            .json()
            .with_target(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true)
            .with_writer(std::io::stderr);

        Registry::default().with(env_filter).with(json_layer).init();
    } else {
        let fmt_layer = fmt::layer()
            .with_target(true)
            .with_thread_names(true)
            .with_writer(std::io::stderr);

        Registry::default().with(env_filter).with(fmt_layer).init();
    }

    tracing::debug!("Tracing initialized: level={}, json={}", level, json);
}

/// Span constructors shared by the session pipeline.
pub mod spans {
    use std::path::Path;

    use tracing::{info_span, Span};
    use uuid::Uuid;

    /// Span covering the lifetime of one watch session.
    #[must_use]
    pub fn session_span(id: &Uuid, directory: &Path) -> Span {
        info_span!(
            "watch_session",
            session_id = %id,
            directory = %directory.display(),
        )
    }

    /// Span for opening one file.
    #[must_use]
    pub fn launch_span(path: &Path) -> Span {
        info_span!("launch", path = %path.display())
    }
}
