// src/exec/backend.rs

//! Pluggable command runner abstraction.
//!
//! The scheduler talks to a `CommandRunner` instead of a concrete executor.
//! Production code uses [`super::ProcessExecutor`]; tests can provide a
//! runner that returns scripted results without spawning processes.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use crate::result::ExecutionResult;

/// Boxed future returned by [`CommandRunner::execute`].
pub type RunFuture<'a> =
    Pin<Box<dyn Future<Output = anyhow::Result<ExecutionResult>> + Send + 'a>>;

/// Trait abstracting how the test command is executed.
pub trait CommandRunner: Send + Sync {
    /// Run `command` once with the given timeout.
    ///
    /// Well-behaved implementations resolve every failure to a failed
    /// [`ExecutionResult`]; an `Err` is treated by the scheduler as an
    /// unexpected fault.
    fn execute<'a>(&'a self, command: &'a str, timeout: Duration) -> RunFuture<'a>;

    /// Kill every execution that is currently in flight.
    fn abort_all_running_executions(&self);
}
