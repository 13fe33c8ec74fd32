//! Logging setup for the quickeda binary.
//!
//! Logs go to stderr and to a daily rolling file in the platform data
//! directory, leaving stdout to CLI output. The library itself only emits `tracing` events; installing a
//! subscriber is the binary's job.
//!
//! ```no_run
//! quickeda::logging::init().expect("Failed to initialize logging");
//! tracing::info!("session started");
//! ```

use anyhow::{Context as _, Result};
use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _};

/// Gets the log directory path based on platform conventions
///
/// Returns:
/// - Windows: `%APPDATA%/quickeda/logs`
/// - macOS: `~/Library/Application Support/quickeda/logs`
/// - Linux: `~/.local/share/quickeda/logs`
pub fn get_log_dir() -> Result<PathBuf> {
    let base_dir = dirs::data_dir().context("Failed to determine data directory")?;

    let log_dir = base_dir.join("quickeda").join("logs");

    if !log_dir.exists() {
        std::fs::create_dir_all(&log_dir)
            .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;
    }

    Ok(log_dir)
}

/// Initializes the logging system with stderr and file output.
///
/// The file appender rotates daily and keeps 7 files. The level defaults to
/// `info` and can be overridden with `RUST_LOG`.
///
/// # Errors
///
/// Returns error if the log directory cannot be created or the file appender fails.
pub fn init() -> Result<()> {
    let log_dir = get_log_dir()?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .max_log_files(7)
        .filename_prefix("quickeda")
        .filename_suffix("log")
        .build(&log_dir)
        .context("Failed to create file appender")?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .context("Failed to create env filter")?;

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true)
        .compact();

    let file_layer = fmt::layer()
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(false)
        .with_writer(file_appender);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::info!("Logging initialized, log directory: {}", log_dir.display());

    Ok(())
}

/// Gets the path to today's log file.
pub fn get_current_log_path() -> Result<PathBuf> {
    let log_dir = get_log_dir()?;
    let today = chrono::Local::now().format("%Y-%m-%d").to_string();
    Ok(log_dir.join(format!("quickeda.{today}.log")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_log_path_is_dated() -> Result<()> {
        let path = get_current_log_path()?;
        let name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_owned();
        assert!(name.starts_with("quickeda."), "unexpected log name {name}");
        assert!(name.ends_with(".log"), "unexpected log name {name}");
        Ok(())
    }
}
