// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `test-executor`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "test-executor",
    version,
    about = "Run a test command periodically and keep its latest result.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `$TEST_EXECUTOR_CONFIG`, else `TestExecutor.toml` in the
    /// current working directory.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Command to run instead of `[executor].command` from the config.
    #[arg(long, value_name = "CMD")]
    pub command: Option<String>,

    /// Execute the command once, print the result as JSON and exit.
    ///
    /// The exit code is non-zero if the test run was unsuccessful.
    #[arg(long)]
    pub once: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TEST_EXECUTOR_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate the config and print it, but don't run anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
