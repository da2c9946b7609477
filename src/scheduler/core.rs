// src/scheduler/core.rs

//! Pure scheduler state machine.
//!
//! The core consumes [`SchedulerEvent`]s and returns the
//! [`SchedulerCommand`]s the IO shell has to carry out. It owns the last
//! result, the Running/Paused state and the single timer slot, and performs
//! no IO itself, so every transition can be unit tested without Tokio.

use tracing::{debug, error, info};

use crate::result::ExecutionResult;

use super::{
    RunId, RunOutcome, RunnerState, SchedulerCommand, SchedulerEvent, TimeOptions, TimerId,
    TimerKind,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ArmedTimer {
    id: TimerId,
    kind: TimerKind,
}

#[derive(Debug)]
pub struct SchedulerCore {
    options: TimeOptions,
    state: RunnerState,
    last_result: ExecutionResult,
    /// At most one timer is armed at any time.
    timer: Option<ArmedTimer>,
    /// The run whose completion will be accepted, if one is in flight.
    current_run: Option<RunId>,
    next_run_id: RunId,
    next_timer_id: TimerId,
    stopped: bool,
}

impl SchedulerCore {
    pub fn new(options: TimeOptions) -> Self {
        Self {
            options,
            state: RunnerState::Running,
            last_result: ExecutionResult::sentinel(),
            timer: None,
            current_run: None,
            next_run_id: 0,
            next_timer_id: 0,
            stopped: false,
        }
    }

    pub fn state(&self) -> RunnerState {
        self.state
    }

    pub fn is_paused(&self) -> bool {
        self.state == RunnerState::Paused
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn last_result(&self) -> &ExecutionResult {
        &self.last_result
    }

    pub fn current_run(&self) -> Option<RunId> {
        self.current_run
    }

    /// The id and kind of the armed timer, if any.
    pub fn armed_timer(&self) -> Option<(TimerId, TimerKind)> {
        self.timer.map(|t| (t.id, t.kind))
    }

    /// Handle a single event and return the commands for the IO shell.
    pub fn step(&mut self, event: SchedulerEvent) -> Vec<SchedulerCommand> {
        if self.stopped {
            debug!(?event, "scheduler stopped; ignoring event");
            return Vec::new();
        }

        match event {
            SchedulerEvent::Start => self.begin_run(),
            SchedulerEvent::RunCompleted { run, outcome } => self.handle_completion(run, outcome),
            SchedulerEvent::TimerFired { timer } => self.handle_timer(timer),
            SchedulerEvent::PauseRequested { duration } => self.pause(duration),
            SchedulerEvent::ResumeRequested => self.resume(),
            SchedulerEvent::StopRequested => self.stop(),
        }
    }

    fn begin_run(&mut self) -> Vec<SchedulerCommand> {
        self.next_run_id += 1;
        let run = self.next_run_id;
        self.current_run = Some(run);
        info!(run_id = run, "starting new async run");
        vec![SchedulerCommand::StartRun { run }]
    }

    fn handle_completion(&mut self, run: RunId, outcome: RunOutcome) -> Vec<SchedulerCommand> {
        if self.current_run != Some(run) {
            info!(run_id = run, "discarding result of an aborted run");
            return Vec::new();
        }
        self.current_run = None;

        let result = match outcome {
            RunOutcome::Finished(result) => result,
            RunOutcome::Fault(message) => {
                error!(run_id = run, error = %message, "unexpected error while executing the runner");
                ExecutionResult::unexpected_fault()
            }
        };
        let delay = self.options.delay_after(result.successful);

        self.handle_result(run, result, delay)
    }

    fn handle_result(
        &mut self,
        run: RunId,
        result: ExecutionResult,
        delay: std::time::Duration,
    ) -> Vec<SchedulerCommand> {
        if self.is_paused() {
            info!(run_id = run, "discarding result of last run, because the runner is currently paused");
            return Vec::new();
        }

        info!(
            run_id = run,
            successful = result.successful,
            next_run_in = ?delay,
            "finished async run"
        );
        self.last_result = result.clone();

        let mut commands = vec![SchedulerCommand::PublishResult(result)];
        commands.extend(self.arm(TimerKind::NextRun, delay));
        commands
    }

    fn handle_timer(&mut self, timer: TimerId) -> Vec<SchedulerCommand> {
        let armed = match self.timer {
            Some(armed) if armed.id == timer => armed,
            _ => {
                debug!(timer_id = timer, "ignoring stale timer");
                return Vec::new();
            }
        };
        self.timer = None;

        match armed.kind {
            TimerKind::NextRun => self.begin_run(),
            TimerKind::PauseWindow => {
                info!("pause window elapsed; resuming async execution");
                self.state = RunnerState::Running;
                self.begin_run()
            }
        }
    }

    fn pause(&mut self, duration: std::time::Duration) -> Vec<SchedulerCommand> {
        info!(
            ?duration,
            "request to pause the async execution received; running processes are cancelled"
        );
        self.state = RunnerState::Paused;
        self.current_run = None;

        let mut commands = vec![SchedulerCommand::AbortExecutions];
        commands.extend(self.arm(TimerKind::PauseWindow, duration));
        commands
    }

    fn resume(&mut self) -> Vec<SchedulerCommand> {
        if !self.is_paused() {
            info!("request to resume the async execution received, but it is not paused; ignoring");
            return Vec::new();
        }

        info!("request to resume the async execution received; starting immediately");
        let mut commands = self.cancel_timer();
        self.state = RunnerState::Running;
        commands.extend(self.begin_run());
        commands
    }

    fn stop(&mut self) -> Vec<SchedulerCommand> {
        info!("stopping async runner");
        self.stopped = true;
        let mut commands = self.cancel_timer();
        commands.push(SchedulerCommand::Exit);
        commands
    }

    /// Put a new timer in the slot, cancelling the previous one.
    fn arm(&mut self, kind: TimerKind, delay: std::time::Duration) -> Vec<SchedulerCommand> {
        let mut commands = self.cancel_timer();

        self.next_timer_id += 1;
        let id = self.next_timer_id;
        self.timer = Some(ArmedTimer { id, kind });
        debug!(timer_id = id, ?kind, ?delay, "timer armed");

        commands.push(SchedulerCommand::ArmTimer { timer: id, delay });
        commands
    }

    fn cancel_timer(&mut self) -> Vec<SchedulerCommand> {
        match self.timer.take() {
            Some(armed) => vec![SchedulerCommand::CancelTimer { timer: armed.id }],
            None => Vec::new(),
        }
    }
}
