//! Logging for scoretable
//!
//! Logs go to stderr and to two daily-rotating files in the log directory:
//!
//! - `scoretable.<date>.log`: everything the env filter lets through
//! - `error.<date>.log`: warnings and errors only
//!
//! Ten files of each kind are kept. The default level is `info`; set
//! `RUST_LOG` to change it.
//!
//! ```no_run
//! use scoretable::logging;
//!
//! // Initialize once at startup
//! logging::init(None).expect("Failed to initialize logging");
//!
//! tracing::info!("ready");
//! ```

use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, Layer as _, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _,
};

/// Resolves and creates the log directory.
///
/// `custom` wins when given; otherwise:
/// - Windows: `%APPDATA%/scoretable/logs`
/// - macOS: `~/Library/Application Support/scoretable/logs`
/// - Linux: `~/.local/share/scoretable/logs`
pub fn get_log_dir(custom: Option<&Path>) -> Result<PathBuf> {
    let log_dir = match custom {
        Some(dir) => dir.to_path_buf(),
        None => dirs::data_dir()
            .context("Failed to determine data directory")?
            .join("scoretable")
            .join("logs"),
    };

    if !log_dir.exists() {
        std::fs::create_dir_all(&log_dir)
            .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;
    }

    Ok(log_dir)
}

fn appender(log_dir: &Path, prefix: &str) -> Result<RollingFileAppender> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .max_log_files(10)
        .filename_prefix(prefix)
        .filename_suffix("log")
        .build(log_dir)
        .with_context(|| format!("Failed to create {prefix} log appender"))
}

/// Installs the global subscriber.
///
/// # Errors
///
/// Returns error if the log directory cannot be created, a file appender
/// fails, or a subscriber is already installed.
pub fn init(log_dir: Option<&Path>) -> Result<()> {
    let log_dir = get_log_dir(log_dir)?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .context("Failed to create env filter")?;

    // stdout carries command results
    let console_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact();

    let all_logs_layer = fmt::layer()
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(false)
        .with_writer(appender(&log_dir, "scoretable")?);

    let error_logs_layer = fmt::layer()
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(false)
        .with_writer(appender(&log_dir, "error")?)
        .with_filter(EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(all_logs_layer)
        .with(error_logs_layer)
        .try_init()
        .context("Failed to install log subscriber")?;

    tracing::debug!(log_dir = %log_dir.display(), "logging initialized");

    Ok(())
}
