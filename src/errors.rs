// src/errors.rs

//! Crate-wide error types.
//!
//! - [`TestExecutorError`] covers configuration and runner lifecycle errors
//!   that are returned to callers.
//! - [`ProtocolError`] and [`ExecutionError`] describe why a single execution
//!   failed. They never escape [`crate::exec::ProcessExecutor::execute`];
//!   the executor converts them into a failed
//!   [`crate::result::ExecutionResult`].

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TestExecutorError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(
        "there is already an instance of the async runner running; create another executor to run a different schedule"
    )]
    RunnerAlreadyStarted,

    #[error("the async runner needs to be started once, by calling start_async_runner")]
    RunnerNotStarted,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Errors raised while reading the JSON-line protocol from a child's stdout.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Could not parse response from child process, got stdout:[{stdout:?}].")]
    NoProtocolLines { stdout: String },

    #[error("invalid JSON in protocol line [{line}]: {source}")]
    InvalidJson {
        line: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed result record [{line}]: {source}")]
    MalformedRecord {
        line: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Why an execution could not produce a regular result.
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("Error accessing results file {path:?}: {source}")]
    ResultResolution {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("command failed: {command}\n{stderr}")]
    Process {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, TestExecutorError>;
