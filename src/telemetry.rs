//! Logging initialisation.
//!
//! Events always go to stderr so that stdout stays clean for JSON responses.
//! When a log directory is configured a second, non-blocking, ANSI-free layer
//! appends to `repogate.log` inside it.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub const LOG_FILE_NAME: &str = "repogate.log";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    /// `EnvFilter` directive, e.g. `info` or `repogate=debug`.
    pub filter: String,
    pub json: bool,
    pub dir: Option<PathBuf>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: false,
            dir: None,
        }
    }
}

/// Install the global subscriber.
///
/// The returned guard flushes the file writer on drop; hold it for the life
/// of the process. Installing twice is a no-op.
pub fn init_logging(settings: &LogSettings) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_new(&settings.filter).unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, guard) = match &settings.dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;
            let appender = tracing_appender::rolling::never(dir, LOG_FILE_NAME);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let plain = (!settings.json)
        .then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));
    let json = settings
        .json
        .then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr));

    // The only failure is an already-installed global subscriber, which stays.
    if let Err(err) = tracing_subscriber::registry()
        .with(filter)
        .with(plain)
        .with(json)
        .with(file_layer)
        .try_init()
    {
        tracing::debug!(error = %err, "subscriber already installed, keeping it");
    }

    Ok(guard)
}
