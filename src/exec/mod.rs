// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for actually running the test command, using
//! `tokio::process::Command`, and for turning what it prints into an
//! [`crate::result::ExecutionResult`].
//!
//! - [`registry`] tracks in-flight executions for bulk cancellation.
//! - [`process`] runs a single child with timeout and cancellation.
//! - [`resolver`] reads (and consumes) the result file named by the child.
//! - [`executor`] ties the above together into `ProcessExecutor`.
//! - [`backend`] provides the `CommandRunner` trait the scheduler uses, so
//!   tests can replace the executor with a fake implementation.

pub mod backend;
pub mod executor;
pub mod process;
pub mod registry;
pub mod resolver;

pub use backend::{CommandRunner, RunFuture};
pub use executor::ProcessExecutor;
pub use process::{KillReason, ProcessOutcome};
pub use registry::{ExecutionId, ExecutionRegistry, IdGenerator, SequentialIdGenerator, UuidIdGenerator};
pub use resolver::{FileResultResolver, ResultResolver};
