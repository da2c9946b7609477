// src/scheduler/mod.rs

//! Periodic background execution of the test command.
//!
//! The scheduler runs the command, stores the result, waits a delay that
//! depends on whether the run succeeded, and runs again. It can be paused for
//! a while (aborting whatever is running) and resumed early.
//!
//! The pure state machine lives in [`core`]; the async/IO shell that owns
//! timers and run tasks is implemented in [`runtime`]; [`handle`] is the
//! public `AsyncRunner` API that callers hold on to.

use std::time::Duration;

use crate::result::ExecutionResult;

pub mod core;
pub mod handle;
pub mod runtime;

pub use self::core::SchedulerCore;
pub use handle::AsyncRunner;
pub use runtime::SchedulerRuntime;

/// Execution timeout used when neither the caller nor the config sets one.
pub const DEFAULT_EXECUTION_TIMEOUT: Duration = Duration::from_secs(60);

/// Identifies one scheduled run. Only the completion of the current run is
/// accepted; completions of aborted runs are discarded.
pub type RunId = u64;

/// Identifies one armed timer. A firing whose id no longer occupies the
/// timer slot is stale and ignored.
pub type TimerId = u64;

/// Scheduling configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeOptions {
    /// How long one execution may take. `None` means the global execution
    /// timeout.
    pub timeout: Option<Duration>,
    /// Delay before the next run after a successful run.
    pub success: Duration,
    /// Delay before the next run after a failed run.
    pub error: Duration,
}

impl TimeOptions {
    pub fn new(success: Duration, error: Duration) -> Self {
        Self {
            timeout: None,
            success,
            error,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Fill in the timeout if none was set.
    pub fn or_default_timeout(mut self, default: Duration) -> Self {
        self.timeout.get_or_insert(default);
        self
    }

    pub fn effective_timeout(&self) -> Duration {
        self.timeout.unwrap_or(DEFAULT_EXECUTION_TIMEOUT)
    }

    pub fn delay_after(&self, successful: bool) -> Duration {
        if successful { self.success } else { self.error }
    }
}

/// The two states of the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerState {
    Running,
    Paused,
}

/// What the armed timer does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Regular delay between two runs.
    NextRun,
    /// End of a pause window; resumes and runs.
    PauseWindow,
}

/// How a run task ended.
#[derive(Debug, Clone)]
pub enum RunOutcome {
    Finished(ExecutionResult),
    /// The runner returned an error or the run task panicked.
    Fault(String),
}

/// Events flowing into the scheduler.
#[derive(Debug, Clone)]
pub enum SchedulerEvent {
    /// Kick off the first run.
    Start,
    RunCompleted { run: RunId, outcome: RunOutcome },
    TimerFired { timer: TimerId },
    PauseRequested { duration: Duration },
    ResumeRequested,
    StopRequested,
}

/// Commands produced by the core for the IO shell.
#[derive(Debug, Clone, PartialEq)]
pub enum SchedulerCommand {
    StartRun { run: RunId },
    ArmTimer { timer: TimerId, delay: Duration },
    CancelTimer { timer: TimerId },
    AbortExecutions,
    PublishResult(ExecutionResult),
    Exit,
}
