// src/scheduler/handle.rs

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::exec::CommandRunner;
use crate::result::ExecutionResult;

use super::core::SchedulerCore;
use super::runtime::SchedulerRuntime;
use super::{SchedulerEvent, TimeOptions};

/// Handle to a running background scheduler.
///
/// Creating one starts the first run immediately. The last result is only
/// ever written by the scheduler loop; this handle hands out snapshots.
///
/// Must be created inside a Tokio runtime.
#[derive(Debug)]
pub struct AsyncRunner {
    events: mpsc::UnboundedSender<SchedulerEvent>,
    last_result: watch::Receiver<ExecutionResult>,
    task: JoinHandle<()>,
}

impl AsyncRunner {
    /// Spawn the scheduler loop for `command`.
    ///
    /// If `options.timeout` is unset, [`super::DEFAULT_EXECUTION_TIMEOUT`]
    /// applies to each execution.
    pub fn start(
        runner: Arc<dyn CommandRunner>,
        command: impl Into<Arc<str>>,
        options: TimeOptions,
    ) -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (result_tx, result_rx) = watch::channel(ExecutionResult::sentinel());

        let runtime = SchedulerRuntime::new(
            SchedulerCore::new(options),
            event_rx,
            event_tx.clone(),
            runner,
            command,
            options.effective_timeout(),
            result_tx,
        );
        let task = tokio::spawn(runtime.run());

        let handle = Self {
            events: event_tx,
            last_result: result_rx,
            task,
        };
        handle.send(SchedulerEvent::Start);
        handle
    }

    /// Snapshot of the most recent result (the sentinel before the first
    /// run has completed).
    pub fn last_result(&self) -> ExecutionResult {
        self.last_result.borrow().clone()
    }

    /// Receiver that is notified each time a new result is stored.
    pub fn subscribe(&self) -> watch::Receiver<ExecutionResult> {
        self.last_result.clone()
    }

    /// Abort running executions and suspend scheduling for `duration`.
    ///
    /// Results of runs that complete while paused are discarded. When the
    /// pause window ends, a new run starts immediately.
    pub fn pause_async_execution(&self, duration: Duration) {
        self.send(SchedulerEvent::PauseRequested { duration });
    }

    /// End a pause early and run immediately. No-op when not paused.
    pub fn resume_async_execution(&self) {
        self.send(SchedulerEvent::ResumeRequested);
    }

    /// Cancel pending timers and shut the scheduler down. The runner can not
    /// be restarted afterwards.
    pub fn stop(&self) {
        self.send(SchedulerEvent::StopRequested);
    }

    /// Whether the scheduler loop has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    fn send(&self, event: SchedulerEvent) {
        if self.events.send(event).is_err() {
            debug!("async runner already stopped; ignoring request");
        }
    }
}

impl Drop for AsyncRunner {
    fn drop(&mut self) {
        let _ = self.events.send(SchedulerEvent::StopRequested);
    }
}
