// src/result.rs

//! The normalized outcome of one execution attempt.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Content type used for bodies produced by the executor itself
/// (diagnostics, errors, the sentinel).
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Level used for protocol log records that don't declare one.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Outcome of a single execution of the test command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub successful: bool,

    /// Payload handed to whoever asks for the result.
    pub body: Value,

    /// If `None`, callers substitute their configured default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,

    /// Side-channel log records printed by the child process.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log: Option<Vec<LogEntry>>,
}

/// A `{"message": ..., "level": ...}` protocol record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(default = "default_log_level")]
    pub level: String,
    pub message: String,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl LogEntry {
    pub fn new(level: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            message: message.into(),
        }
    }
}

impl ExecutionResult {
    /// Placeholder served before the first scheduled run has completed.
    ///
    /// It reports success so that a freshly started service is not flagged
    /// as broken while its first test run is still in progress.
    pub fn sentinel() -> Self {
        Self {
            successful: true,
            body: json!({
                "message": "There is no completed test run yet, the first test is still running"
            }),
            content_type: Some(JSON_CONTENT_TYPE.to_string()),
            start_time: None,
            end_time: None,
            log: None,
        }
    }

    pub fn success(body: Value) -> Self {
        Self {
            successful: true,
            body,
            content_type: None,
            start_time: None,
            end_time: None,
            log: None,
        }
    }

    /// Failed result with a JSON body.
    pub fn failure(body: Value) -> Self {
        Self {
            successful: false,
            body,
            content_type: Some(JSON_CONTENT_TYPE.to_string()),
            start_time: None,
            end_time: None,
            log: None,
        }
    }

    /// Failed result carrying `{error, stack}` for an error chain.
    pub fn from_error(err: &(dyn std::error::Error + 'static)) -> Self {
        let mut stack = Vec::new();
        let mut current = Some(err);
        while let Some(e) = current {
            stack.push(e.to_string());
            current = e.source();
        }

        Self::failure(json!({
            "error": err.to_string(),
            "stack": stack.join("\ncaused by: "),
        }))
    }

    /// Generic failure used when a scheduled run fails in an unforeseen way.
    pub fn unexpected_fault() -> Self {
        Self::failure(json!({ "message": "Unexpected error, please check the logs" }))
    }

    pub fn content_type_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.content_type.as_deref().unwrap_or(default)
    }
}
