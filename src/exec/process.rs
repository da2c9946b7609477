// src/exec/process.rs

//! Single child process runner.

use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// How long to keep draining the output pipes after the child has exited.
///
/// Grandchildren of the shell may keep the pipes open after the shell itself
/// was killed; in that case we settle for what has been read so far.
const PIPE_DRAIN_GRACE: Duration = Duration::from_millis(200);

/// Why a child was terminated by a kill rather than exiting on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KillReason {
    /// The execution timeout elapsed.
    Timeout,
    /// `kill_all` was called on the registry.
    Aborted,
    /// Terminated from outside by SIGKILL or SIGTERM.
    Signal(i32),
}

/// How a child process ended. Every variant carries the stdout that could be
/// collected, so protocol parsing always gets a uniform input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    Completed {
        stdout: String,
    },
    Killed {
        stdout: String,
        reason: KillReason,
    },
    Failed {
        stdout: String,
        stderr: String,
        exit_code: Option<i32>,
    },
}

impl ProcessOutcome {
    pub fn stdout(&self) -> &str {
        match self {
            ProcessOutcome::Completed { stdout }
            | ProcessOutcome::Killed { stdout, .. }
            | ProcessOutcome::Failed { stdout, .. } => stdout,
        }
    }
}

/// Build a shell command appropriate for the platform.
fn shell_command(command: &str) -> Command {
    if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(command);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(command);
        c
    }
}

/// Run `command` through the shell until it exits, the timeout elapses, or
/// the cancel channel fires.
///
/// Both timeout and cancellation kill the child unconditionally (SIGKILL on
/// unix). A closed cancel channel without a message is not a cancellation.
pub async fn run_process(
    execution_id: &str,
    command: &str,
    timeout: Duration,
    cancel_rx: oneshot::Receiver<()>,
) -> Result<ProcessOutcome> {
    debug!(execution_id, cmd = %command, ?timeout, "starting process");

    let mut cmd = shell_command(command);
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning process for command '{command}'"))?;

    let stdout = PipeCollector::spawn(child.stdout.take());
    let stderr = PipeCollector::spawn(child.stderr.take());

    let cancelled = async {
        match cancel_rx.await {
            Ok(()) => (),
            // Sender dropped without a kill request; never resolve.
            Err(_) => std::future::pending().await,
        }
    };

    let killed = tokio::select! {
        status_res = child.wait() => {
            let status = status_res
                .with_context(|| format!("waiting for process of command '{command}'"))?;
            return Ok(finish(execution_id, status, stdout, stderr).await);
        }
        _ = tokio::time::sleep(timeout) => KillReason::Timeout,
        _ = cancelled => KillReason::Aborted,
    };

    info!(execution_id, reason = ?killed, "killing process");
    kill(execution_id, &mut child).await;

    Ok(ProcessOutcome::Killed {
        stdout: stdout.finish().await,
        reason: killed,
    })
}

async fn kill(execution_id: &str, child: &mut Child) {
    if let Err(e) = child.kill().await {
        warn!(execution_id, error = %e, "failed to kill child process");
    }
}

async fn finish(
    execution_id: &str,
    status: ExitStatus,
    stdout: PipeCollector,
    stderr: PipeCollector,
) -> ProcessOutcome {
    let code = status.code();
    info!(
        execution_id,
        exit_code = ?code,
        success = status.success(),
        "process exited"
    );

    let stdout = stdout.finish().await;
    if status.success() {
        return ProcessOutcome::Completed { stdout };
    }

    if let Some(signal) = terminating_signal(&status) {
        debug!(execution_id, signal, "process was terminated by a kill signal");
        return ProcessOutcome::Killed {
            stdout,
            reason: KillReason::Signal(signal),
        };
    }

    ProcessOutcome::Failed {
        stdout,
        stderr: stderr.finish().await,
        exit_code: code,
    }
}

#[cfg(unix)]
fn terminating_signal(status: &ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;

    const SIGKILL: i32 = 9;
    const SIGTERM: i32 = 15;

    status
        .signal()
        .filter(|signal| *signal == SIGKILL || *signal == SIGTERM)
}

#[cfg(not(unix))]
fn terminating_signal(_status: &ExitStatus) -> Option<i32> {
    None
}

/// Collects everything a pipe produces in a background task.
///
/// Bytes land in a shared buffer as they are read, so a partial output is
/// available even if the reader has to be abandoned.
struct PipeCollector {
    buffer: Arc<Mutex<Vec<u8>>>,
    handle: Option<JoinHandle<()>>,
}

impl PipeCollector {
    fn spawn<R>(pipe: Option<R>) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let handle = pipe.map(|mut pipe| {
            let buffer = Arc::clone(&buffer);
            tokio::spawn(async move {
                let mut chunk = [0u8; 8192];
                loop {
                    match pipe.read(&mut chunk).await {
                        Ok(0) => break,
                        Ok(n) => buffer
                            .lock()
                            .unwrap_or_else(|p| p.into_inner())
                            .extend_from_slice(&chunk[..n]),
                        Err(e) => {
                            debug!(error = %e, "pipe read error");
                            break;
                        }
                    }
                }
            })
        });

        Self { buffer, handle }
    }

    async fn finish(mut self) -> String {
        if let Some(mut handle) = self.handle.take() {
            if tokio::time::timeout(PIPE_DRAIN_GRACE, &mut handle).await.is_err() {
                debug!("pipe still open after grace period; using partial output");
                handle.abort();
            }
        }

        let bytes = self.buffer.lock().unwrap_or_else(|p| p.into_inner());
        String::from_utf8_lossy(&bytes).into_owned()
    }
}
