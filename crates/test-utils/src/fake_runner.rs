use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;
use test_executor::exec::{CommandRunner, RunFuture};
use test_executor::result::ExecutionResult;
use tokio::time::Instant;

/// One scripted answer of [`ScriptedRunner`].
#[derive(Debug, Clone)]
pub enum Step {
    Result(ExecutionResult),
    /// `execute` returns an error.
    Fault(String),
    /// `execute` panics.
    Panic,
}

/// A fake runner that:
/// - answers the n-th `execute` call with the n-th scripted step, after
///   waiting `duration` (simulating a test run that takes time)
/// - never answers once the script is exhausted
/// - records when each call started and how often executions were aborted
#[derive(Debug, Clone)]
pub struct ScriptedRunner {
    steps: Arc<Mutex<VecDeque<Step>>>,
    duration: Duration,
    calls: Arc<Mutex<Vec<Instant>>>,
    aborts: Arc<AtomicUsize>,
}

impl ScriptedRunner {
    pub fn new(steps: Vec<Step>, duration: Duration) -> Self {
        Self {
            steps: Arc::new(Mutex::new(steps.into())),
            duration,
            calls: Arc::new(Mutex::new(Vec::new())),
            aborts: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Runner answering with the given results, in order.
    pub fn with_results(results: Vec<ExecutionResult>, duration: Duration) -> Self {
        Self::new(results.into_iter().map(Step::Result).collect(), duration)
    }

    /// Start instants of all `execute` calls so far.
    pub fn calls(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn abort_count(&self) -> usize {
        self.aborts.load(Ordering::SeqCst)
    }
}

impl CommandRunner for ScriptedRunner {
    fn execute<'a>(&'a self, _command: &'a str, _timeout: Duration) -> RunFuture<'a> {
        self.calls.lock().unwrap().push(Instant::now());
        let step = self.steps.lock().unwrap().pop_front();
        let duration = self.duration;

        Box::pin(async move {
            let Some(step) = step else {
                return std::future::pending().await;
            };

            tokio::time::sleep(duration).await;
            match step {
                Step::Result(result) => Ok(result),
                Step::Fault(message) => Err(anyhow::anyhow!(message)),
                Step::Panic => panic!("scripted runner panic"),
            }
        })
    }

    fn abort_all_running_executions(&self) {
        self.aborts.fetch_add(1, Ordering::SeqCst);
    }
}

/// Successful result whose body is `{"test": n}`.
pub fn numbered_result(n: usize) -> ExecutionResult {
    ExecutionResult::success(json!({ "test": n }))
}

/// `n` successful results with bodies `{"test": 0}` .. `{"test": n-1}`.
pub fn numbered_results(n: usize) -> Vec<ExecutionResult> {
    (0..n).map(numbered_result).collect()
}

/// Failed result whose body is `{"test": label}`.
pub fn failed_result(label: &str) -> ExecutionResult {
    let mut result = ExecutionResult::success(json!({ "test": label }));
    result.successful = false;
    result
}
