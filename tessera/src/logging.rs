//! Tracing subscriber setup.
//!
//! Console output goes to stderr. An optional log file receives the same
//! events through a non-blocking writer; keep the returned guard alive for
//! as long as events should be flushed to it.

use std::path::Path;

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Invalid log file path: {0}")]
    InvalidPath(String),

    #[error("Failed to create log directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to install tracing subscriber: {0}")]
    Init(String),
}

/// Level name for a `-v` count.
pub fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Filter honouring `RUST_LOG`, else the verbosity level for tessera crates.
pub fn env_filter(verbosity: u8) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(verbosity))
}

fn default_filter(verbosity: u8) -> EnvFilter {
    let level = level_for(verbosity);
    EnvFilter::new(format!("warn,tessera={level},tessera_cli={level}"))
}

/// Install the global subscriber.
///
/// # Arguments
///
/// * `verbosity` - Number of `-v` flags (0 = warnings only)
/// * `log_file` - Optional file that also receives every event
///
/// # Errors
///
/// Fails if the log file location is unusable or a subscriber is already
/// installed.
pub fn init(verbosity: u8, log_file: Option<&Path>) -> Result<Option<WorkerGuard>, LoggingError> {
    let (file_layer, guard) = match log_file {
        Some(path) => {
            let file_name = path
                .file_name()
                .ok_or_else(|| LoggingError::InvalidPath(path.display().to_string()))?;
            let dir = match path.parent() {
                Some(dir) if !dir.as_os_str().is_empty() => dir,
                _ => Path::new("."),
            };
            std::fs::create_dir_all(dir)?;

            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_timer(LocalTime::rfc_3339());
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter(verbosity))
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(file_layer)
        .try_init()
        .map_err(|e| LoggingError::Init(e.to_string()))?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_for_verbosity() {
        assert_eq!(level_for(0), "warn");
        assert_eq!(level_for(1), "info");
        assert_eq!(level_for(2), "debug");
        assert_eq!(level_for(9), "trace");
    }

    #[test]
    fn test_default_filter_names_crates() {
        let filter = default_filter(2).to_string();
        assert!(filter.contains("tessera=debug"));
        assert!(filter.contains("tessera_cli=debug"));
    }

    #[test]
    fn test_init_rejects_directory_path() {
        let err = init(0, Some(Path::new("/"))).unwrap_err();
        assert!(matches!(err, LoggingError::InvalidPath(_)));
    }
}
