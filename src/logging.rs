// src/logging.rs

//! Logging setup for `test-executor` using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the log level:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `TEST_EXECUTOR_LOG` environment variable (e.g. "info", "debug")
//! 3. default to `info`
//!
//! Logs are sent to STDERR so that `--once` can print the result on stdout.

use anyhow::Result;
use tracing_subscriber::fmt;

use crate::cli::LogLevel;

/// Initialise global logging subscriber.
///
/// Safe to call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let level = match cli_level {
        Some(lvl) => level_from_log_level(lvl),
        None => std::env::var("TEST_EXECUTOR_LOG")
            .ok()
            .and_then(|s| parse_level_str(&s))
            .unwrap_or(tracing::Level::INFO),
    };

    fmt()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

fn level_from_log_level(lvl: LogLevel) -> tracing::Level {
    match lvl {
        LogLevel::Error => tracing::Level::ERROR,
        LogLevel::Warn => tracing::Level::WARN,
        LogLevel::Info => tracing::Level::INFO,
        LogLevel::Debug => tracing::Level::DEBUG,
        LogLevel::Trace => tracing::Level::TRACE,
    }
}

/// Map a level name to a tracing level.
///
/// Besides the tracing names this accepts the npm-style names test runners
/// tend to print (`verbose`, `silly`).
pub fn parse_level_str(s: &str) -> Option<tracing::Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(tracing::Level::ERROR),
        "warn" | "warning" => Some(tracing::Level::WARN),
        "info" | "http" => Some(tracing::Level::INFO),
        "debug" | "verbose" => Some(tracing::Level::DEBUG),
        "trace" | "silly" => Some(tracing::Level::TRACE),
        _ => None,
    }
}

/// Re-emit a log record printed by the child process at its declared level.
///
/// Unknown levels are logged at `info`.
pub fn emit_child_log(level: &str, message: &str) {
    let level = parse_level_str(level).unwrap_or(tracing::Level::INFO);

    if level == tracing::Level::ERROR {
        tracing::error!(target: "test_executor::child", "{message}");
    } else if level == tracing::Level::WARN {
        tracing::warn!(target: "test_executor::child", "{message}");
    } else if level == tracing::Level::INFO {
        tracing::info!(target: "test_executor::child", "{message}");
    } else if level == tracing::Level::DEBUG {
        tracing::debug!(target: "test_executor::child", "{message}");
    } else {
        tracing::trace!(target: "test_executor::child", "{message}");
    }
}
