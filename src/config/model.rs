// src/config/model.rs

use std::time::Duration;

use serde::Deserialize;

use crate::scheduler::TimeOptions;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [executor]
/// command = "npm test"
/// execution_timeout = "60s"
/// content_type = "text/xml"
///
/// [schedule]
/// success = "1h"
/// error = "10m"
/// ```
///
/// Durations are strings like `"250ms"`, `"3s"`, `"10m"` or `"2h"`. They
/// are parsed during validation, which turns a `RawConfigFile` into a
/// [`ConfigFile`].
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    pub executor: RawExecutorSection,

    #[serde(default)]
    pub schedule: RawScheduleSection,
}

/// `[executor]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RawExecutorSection {
    /// Shell command that runs the test suite.
    pub command: String,

    #[serde(default = "default_execution_timeout")]
    pub execution_timeout: String,

    /// Content type reported for results that don't set one themselves.
    #[serde(default = "default_content_type")]
    pub content_type: String,
}

/// `[schedule]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RawScheduleSection {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Per-run timeout for scheduled runs; falls back to
    /// `executor.execution_timeout`.
    #[serde(default)]
    pub timeout: Option<String>,

    #[serde(default = "default_success_delay")]
    pub success: String,

    #[serde(default = "default_error_delay")]
    pub error: String,

    /// Default pause window when a pause request doesn't specify one.
    #[serde(default = "default_pause")]
    pub pause: String,
}

fn default_execution_timeout() -> String {
    "60s".to_string()
}

fn default_content_type() -> String {
    "application/xml".to_string()
}

fn default_enabled() -> bool {
    true
}

fn default_success_delay() -> String {
    "1h".to_string()
}

fn default_error_delay() -> String {
    "10m".to_string()
}

fn default_pause() -> String {
    "2h".to_string()
}

impl Default for RawScheduleSection {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            timeout: None,
            success: default_success_delay(),
            error: default_error_delay(),
            pause: default_pause(),
        }
    }
}

/// Validated configuration with parsed durations.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    pub executor: ExecutorSettings,
    pub schedule: ScheduleSettings,
}

/// Settings of the one-shot executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorSettings {
    pub command: String,
    pub execution_timeout: Duration,
    pub content_type: String,
}

/// Settings of the background scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleSettings {
    pub enabled: bool,
    pub time_options: TimeOptions,
    pub pause: Duration,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(executor: ExecutorSettings, schedule: ScheduleSettings) -> Self {
        Self { executor, schedule }
    }
}
