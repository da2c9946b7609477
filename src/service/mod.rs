// src/service/mod.rs

//! Entry points for a surrounding request-routing layer.
//!
//! [`TestExecutor`] bundles the one-shot execution path and a single
//! background [`AsyncRunner`], and maps results to [`ResultResponse`]s
//! (status, content type, body, test start/end).

pub mod response;

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info};

use crate::config::ExecutorSettings;
use crate::errors::{Result, TestExecutorError};
use crate::exec::CommandRunner;
use crate::result::ExecutionResult;
use crate::scheduler::{AsyncRunner, TimeOptions};

pub use crate::protocol::build_result_string;
pub use response::{ResultResponse, STATUS_OK, STATUS_UNAVAILABLE};

/// Pause window used when a pause request doesn't name one.
pub const DEFAULT_PAUSE: Duration = Duration::from_secs(2 * 60 * 60);

/// One configured test command, runnable on demand and on a schedule.
///
/// Only one background runner may be started per instance; create another
/// `TestExecutor` to run a second schedule.
pub struct TestExecutor {
    settings: ExecutorSettings,
    runner: Arc<dyn CommandRunner>,
    default_pause: Duration,
    async_runner: Mutex<Option<AsyncRunner>>,
}

impl std::fmt::Debug for TestExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestExecutor")
            .field("settings", &self.settings)
            .field("default_pause", &self.default_pause)
            .finish_non_exhaustive()
    }
}

impl TestExecutor {
    pub fn new(settings: ExecutorSettings, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            settings,
            runner,
            default_pause: DEFAULT_PAUSE,
            async_runner: Mutex::new(None),
        }
    }

    /// Pause window used by `pause_async_runner(None)`.
    pub fn with_default_pause(mut self, pause: Duration) -> Self {
        self.default_pause = pause;
        self
    }

    pub fn settings(&self) -> &ExecutorSettings {
        &self.settings
    }

    /// Run the command right now with the global execution timeout.
    pub async fn execute_now(&self) -> ResultResponse {
        debug!(cmd = %self.settings.command, "start to execute command");
        let result = match self
            .runner
            .execute(&self.settings.command, self.settings.execution_timeout)
            .await
        {
            Ok(result) => result,
            Err(err) => ExecutionResult::from_error(&*err),
        };
        self.respond(&result)
    }

    /// Start the background runner.
    ///
    /// A missing `timeout` in `options` is filled with the global execution
    /// timeout. Fails if a runner was already started on this instance.
    pub fn start_async_runner(&self, options: TimeOptions) -> Result<()> {
        let mut slot = self.slot();
        if slot.is_some() {
            return Err(TestExecutorError::RunnerAlreadyStarted);
        }

        let options = options.or_default_timeout(self.settings.execution_timeout);
        info!(?options, "starting async runner");
        *slot = Some(AsyncRunner::start(
            Arc::clone(&self.runner),
            self.settings.command.as_str(),
            options,
        ));
        Ok(())
    }

    /// Pause the background runner; `None` pauses for the default window
    /// ([`DEFAULT_PAUSE`] unless configured otherwise).
    pub fn pause_async_runner(&self, duration: Option<Duration>) -> Result<()> {
        let duration = duration.unwrap_or(self.default_pause);
        self.with_runner(|runner| runner.pause_async_execution(duration))
    }

    pub fn resume_async_runner(&self) -> Result<()> {
        self.with_runner(AsyncRunner::resume_async_execution)
    }

    pub fn last_result(&self) -> Result<ExecutionResult> {
        self.with_runner(AsyncRunner::last_result)
    }

    /// Response for the latest background result.
    pub fn last_result_response(&self) -> Result<ResultResponse> {
        let result = self.last_result()?;
        Ok(self.respond(&result))
    }

    /// Receiver notified whenever the background runner stores a result.
    pub fn subscribe(&self) -> Result<watch::Receiver<ExecutionResult>> {
        self.with_runner(AsyncRunner::subscribe)
    }

    pub fn stop(&self) -> Result<()> {
        self.with_runner(AsyncRunner::stop)
    }

    pub fn respond(&self, result: &ExecutionResult) -> ResultResponse {
        ResultResponse::from_result(result, &self.settings.content_type)
    }

    fn with_runner<T>(&self, f: impl FnOnce(&AsyncRunner) -> T) -> Result<T> {
        let slot = self.slot();
        let runner = slot.as_ref().ok_or(TestExecutorError::RunnerNotStarted)?;
        Ok(f(runner))
    }

    fn slot(&self) -> MutexGuard<'_, Option<AsyncRunner>> {
        self.async_runner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
