//! Logging configuration using tracing

use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::Result;

/// Environment variable holding the log filter directive.
pub const LOG_ENV_VAR: &str = "HEAPSCOPE_LOG";

const LOG_FILE_NAME: &str = "heapscope.log";

/// Initialize the logging subsystem
///
/// Logs are written to `~/.local/share/heapscope/logs/` so the terminal
/// only ever carries command output. The level is controlled by the
/// `HEAPSCOPE_LOG` environment variable.
///
/// # Examples
/// ```bash
/// HEAPSCOPE_LOG=debug heapscope ivars 0x600001130660
/// HEAPSCOPE_LOG=heapscope_agent=trace heapscope
/// ```
pub fn init() -> Result<()> {
    let log_dir = get_log_directory();
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, LOG_FILE_NAME);

    let env_filter =
        EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(default_filter()));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true)
                .with_timer(fmt::time::ChronoLocal::new(
                    "%Y-%m-%d %H:%M:%S%.3f".to_string(),
                )),
        )
        .init();

    tracing::info!("heapscope {} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!("Log directory: {}", log_dir.display());

    Ok(())
}

/// Filter used when `HEAPSCOPE_LOG` is unset or unparsable.
fn default_filter() -> &'static str {
    "heapscope=info,warn"
}

/// Get the log directory path
fn get_log_directory() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("heapscope").join("logs")
}

/// Get the log file path for the current day
pub fn get_current_log_file() -> PathBuf {
    get_log_directory().join(LOG_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_lives_under_heapscope_dir() {
        let path = get_current_log_file();
        assert!(path.ends_with("heapscope/logs/heapscope.log"));
    }

    #[test]
    fn test_default_filter_parses() {
        assert!(EnvFilter::try_new(default_filter()).is_ok());
    }
}
