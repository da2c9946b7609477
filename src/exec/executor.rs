// src/exec/executor.rs

//! Executes the test command and turns its output into an [`ExecutionResult`].

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tracing::{debug, error, warn};

use crate::errors::ExecutionError;
use crate::exec::backend::{CommandRunner, RunFuture};
use crate::exec::process::{run_process, ProcessOutcome};
use crate::exec::registry::{ExecutionRegistry, Registration};
use crate::exec::resolver::{FileResultResolver, ResultResolver};
use crate::protocol::parse_response;
use crate::result::ExecutionResult;

/// Runs commands as child processes and tracks them for bulk cancellation.
///
/// `execute` may be called concurrently; each call registers its own entry
/// in the shared [`ExecutionRegistry`].
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    registry: Arc<ExecutionRegistry>,
    resolver: Arc<dyn ResultResolver>,
}

impl Default for ProcessExecutor {
    fn default() -> Self {
        Self::new(Arc::new(FileResultResolver::default()))
    }
}

impl ProcessExecutor {
    pub fn new(resolver: Arc<dyn ResultResolver>) -> Self {
        Self::with_registry(Arc::new(ExecutionRegistry::default()), resolver)
    }

    pub fn with_registry(
        registry: Arc<ExecutionRegistry>,
        resolver: Arc<dyn ResultResolver>,
    ) -> Self {
        Self { registry, resolver }
    }

    pub fn registry(&self) -> &Arc<ExecutionRegistry> {
        &self.registry
    }

    /// Run `command` once and return its normalized result.
    ///
    /// Never fails: process errors, protocol errors and result file errors
    /// all come back as a result with `successful == false`.
    pub async fn execute(&self, command: &str, timeout: Duration) -> ExecutionResult {
        let outcome = {
            let (registration, cancel_rx) = Registration::new(Arc::clone(&self.registry));
            run_process(registration.id(), command, timeout, cancel_rx).await
        };

        let stdout = match outcome {
            Ok(ProcessOutcome::Completed { stdout }) => stdout,
            Ok(ProcessOutcome::Killed { stdout, reason }) => {
                debug!(cmd = %command, ?reason, "process was killed; parsing available stdout");
                stdout
            }
            Ok(ProcessOutcome::Failed {
                stdout,
                stderr,
                exit_code,
            }) => {
                if stdout.is_empty() {
                    let err = ExecutionError::Process {
                        command: command.to_string(),
                        exit_code,
                        stderr,
                    };
                    error!(cmd = %command, ?exit_code, error = %err, "command failed");
                    return ExecutionResult::from_error(&err);
                }
                debug!(cmd = %command, ?exit_code, "command exited non-zero; parsing its stdout");
                stdout
            }
            Err(err) => {
                error!(cmd = %command, error = %err, "could not run command");
                return ExecutionResult::from_error(&*err);
            }
        };

        match self.interpret(&stdout).await {
            Ok(result) => result,
            Err(err) => {
                error!(
                    stdout = %stdout,
                    error = %err,
                    "error while evaluating the child process; it may have timed out, consider a longer execution timeout"
                );
                ExecutionResult::from_error(&err)
            }
        }
    }

    /// Kill every running child. Returns how many were signalled.
    pub fn abort_all_running_executions(&self) -> usize {
        self.registry.kill_all()
    }

    async fn interpret(&self, stdout: &str) -> Result<ExecutionResult, ExecutionError> {
        let response = parse_response(stdout)?;

        let mut result = match response.file.as_deref() {
            None => ExecutionResult::failure(json!({
                "message": format!(
                    "The response from the child process is missing the file field, the response was: {}",
                    response.to_json_string()
                )
            })),
            Some(file) => {
                let path = Path::new(file);
                let body = self.resolver.resolve(path).await.map_err(|source| {
                    ExecutionError::ResultResolution {
                        path: path.to_path_buf(),
                        source,
                    }
                })?;

                let mut result = ExecutionResult::success(body);
                if !response.log.is_empty() {
                    result.log = Some(response.log.clone());
                }
                result
            }
        };

        if response.indicates_failure() {
            result.successful = false;
            warn!(response = %response.to_json_string(), body = %result.body, "test run unsuccessful");
        }

        Ok(result)
    }
}

impl CommandRunner for ProcessExecutor {
    fn execute<'a>(&'a self, command: &'a str, timeout: Duration) -> RunFuture<'a> {
        Box::pin(async move { Ok(ProcessExecutor::execute(self, command, timeout).await) })
    }

    fn abort_all_running_executions(&self) {
        ProcessExecutor::abort_all_running_executions(self);
    }
}
