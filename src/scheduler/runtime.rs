// src/scheduler/runtime.rs

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, watch};
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, info};

use crate::exec::CommandRunner;
use crate::result::ExecutionResult;

use super::core::SchedulerCore;
use super::{RunId, RunOutcome, SchedulerCommand, SchedulerEvent, TimerId};

/// Drives the scheduler core in response to `SchedulerEvent`s and delegates
/// command execution to a `CommandRunner`.
///
/// All semantics live in [`SchedulerCore`]; this shell spawns run tasks,
/// arms and cancels timers, and publishes the last result.
pub struct SchedulerRuntime {
    core: SchedulerCore,
    event_rx: mpsc::UnboundedReceiver<SchedulerEvent>,
    event_tx: mpsc::UnboundedSender<SchedulerEvent>,
    runner: Arc<dyn CommandRunner>,
    command: Arc<str>,
    timeout: Duration,
    timers: HashMap<TimerId, JoinHandle<()>>,
    /// Executions of runs that may still be in flight.
    runs: HashMap<RunId, AbortHandle>,
    result_tx: watch::Sender<ExecutionResult>,
}

impl fmt::Debug for SchedulerRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchedulerRuntime")
            .field("core", &self.core)
            .field("command", &self.command)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl SchedulerRuntime {
    pub fn new(
        core: SchedulerCore,
        event_rx: mpsc::UnboundedReceiver<SchedulerEvent>,
        event_tx: mpsc::UnboundedSender<SchedulerEvent>,
        runner: Arc<dyn CommandRunner>,
        command: impl Into<Arc<str>>,
        timeout: Duration,
        result_tx: watch::Sender<ExecutionResult>,
    ) -> Self {
        Self {
            core,
            event_rx,
            event_tx,
            runner,
            command: command.into(),
            timeout,
            timers: HashMap::new(),
            runs: HashMap::new(),
            result_tx,
        }
    }

    /// Main event loop.
    ///
    /// Runs until the core asks to exit or every event sender is gone.
    pub async fn run(mut self) {
        info!(cmd = %self.command, timeout = ?self.timeout, "async runner started");

        'events: while let Some(event) = self.event_rx.recv().await {
            debug!(?event, "scheduler received event");

            for command in self.core.step(event) {
                if !self.execute_command(command) {
                    break 'events;
                }
            }
        }

        for (_, timer) in self.timers.drain() {
            timer.abort();
        }
        info!("async runner exiting");
    }

    /// Execute a single command from the core. Returns `false` on exit.
    fn execute_command(&mut self, command: SchedulerCommand) -> bool {
        match command {
            SchedulerCommand::StartRun { run } => self.start_run(run),
            SchedulerCommand::ArmTimer { timer, delay } => self.arm_timer(timer, delay),
            SchedulerCommand::CancelTimer { timer } => {
                if let Some(handle) = self.timers.remove(&timer) {
                    handle.abort();
                    debug!(timer_id = timer, "timer cancelled");
                }
            }
            SchedulerCommand::AbortExecutions => self.abort_runs(),
            SchedulerCommand::PublishResult(result) => {
                self.result_tx.send_replace(result);
            }
            SchedulerCommand::Exit => return false,
        }
        true
    }

    fn start_run(&mut self, run: RunId) {
        let runner = Arc::clone(&self.runner);
        let command = Arc::clone(&self.command);
        let timeout = self.timeout;
        let event_tx = self.event_tx.clone();

        // The execution gets its own task so a panic inside the runner
        // surfaces as a JoinError, and so a pause can abort it before it
        // has registered its process anywhere.
        let execution = tokio::spawn(async move {
            let start_time = Utc::now();
            let mut result = runner.execute(&command, timeout).await?;
            result.start_time = Some(start_time);
            result.end_time = Some(Utc::now());
            Ok::<_, anyhow::Error>(result)
        });

        self.runs.retain(|_, h| !h.is_finished());
        self.runs.insert(run, execution.abort_handle());

        tokio::spawn(async move {
            let outcome = match execution.await {
                Ok(Ok(result)) => RunOutcome::Finished(result),
                Ok(Err(err)) => RunOutcome::Fault(format!("{err:#}")),
                Err(join_err) if join_err.is_cancelled() => {
                    debug!(run_id = run, "run aborted");
                    return;
                }
                Err(join_err) => RunOutcome::Fault(format!("run task failed: {join_err}")),
            };

            if event_tx
                .send(SchedulerEvent::RunCompleted { run, outcome })
                .is_err()
            {
                debug!(run_id = run, "scheduler gone before run completed");
            }
        });
    }

    /// Kill running processes and drop every in-flight run task.
    ///
    /// Dropping a task that already spawned its child kills the child
    /// (`kill_on_drop`); a task that was not polled yet never spawns one.
    fn abort_runs(&mut self) {
        self.runner.abort_all_running_executions();
        for (run, handle) in self.runs.drain() {
            if !handle.is_finished() {
                debug!(run_id = run, "aborting run task");
                handle.abort();
            }
        }
    }

    fn arm_timer(&mut self, timer: TimerId, delay: Duration) {
        let event_tx = self.event_tx.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = event_tx.send(SchedulerEvent::TimerFired { timer });
        });

        // Finished timers are pruned lazily whenever a new one is armed.
        self.timers.retain(|_, h| !h.is_finished());
        self.timers.insert(timer, handle);
    }
}
