//! Logging helpers.
//!
//! Thin wrappers over `tracing` so call sites read the same everywhere:
//! `log_info`, `log_success`, `log_warning`, `log_error`. The binary installs
//! a `tracing-subscriber` formatter with [`init_logging`]; library users
//! install their own subscriber or get no output.

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// Log level of an engine message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Emit a message at the given level.
pub fn log(level: LogLevel, message: impl Into<String>) {
    let message = message.into();
    match level {
        LogLevel::Info => tracing::info!("{}", message),
        LogLevel::Success => tracing::info!(outcome = "success", "{}", message),
        LogLevel::Warning => tracing::warn!("{}", message),
        LogLevel::Error => tracing::error!("{}", message),
    }
}

pub fn log_info(msg: impl Into<String>) {
    log(LogLevel::Info, msg);
}

pub fn log_success(msg: impl Into<String>) {
    log(LogLevel::Success, msg);
}

pub fn log_warning(msg: impl Into<String>) {
    log(LogLevel::Warning, msg);
}

pub fn log_error(msg: impl Into<String>) {
    log(LogLevel::Error, msg);
}

/// Install the stderr formatter. `RUST_LOG` overrides `default_filter`.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
