// tests/process_executor.rs
//
// These tests spawn real `sh` processes.
#![cfg(unix)]

use std::error::Error;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::{json, Value};
use test_executor::exec::{
    ExecutionRegistry, FileResultResolver, ProcessExecutor, SequentialIdGenerator,
};
use test_executor::fs::{FileSystem, MockFileSystem};
use test_executor::protocol::build_result_string;
use test_executor_test_utils::{init_tracing, wait_until, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

const EXECUTION_TIMEOUT: Duration = Duration::from_secs(5);
const SHORT_TIMEOUT: Duration = Duration::from_millis(200);

/// Executor whose result files live in the returned mock filesystem.
fn executor_with_files(files: &[(&str, &str)]) -> (ProcessExecutor, MockFileSystem) {
    let fs = MockFileSystem::new();
    for (path, content) in files {
        fs.add_file(path, *content);
    }

    let registry = ExecutionRegistry::new(Box::new(SequentialIdGenerator::default()));
    let executor = ProcessExecutor::with_registry(
        Arc::new(registry),
        Arc::new(FileResultResolver::new(Arc::new(fs.clone()))),
    );
    (executor, fs)
}

fn echo_result(success: bool, file: &str) -> String {
    format!("echo \"{}\"", build_result_string(success, file))
}

async fn wait_for_running(executor: &ProcessExecutor, count: usize) {
    let registry = executor.registry();
    wait_until("executions are running", || registry.len() >= count).await;
}

#[tokio::test]
async fn test_executes_a_simple_command() -> TestResult {
    init_tracing();
    let (executor, fs) = executor_with_files(&[("file.file", "<testsuite/>")]);

    let result = executor
        .execute(&echo_result(true, "file.file"), EXECUTION_TIMEOUT)
        .await;

    assert!(result.successful, "unexpected failure: {}", result.body);
    assert_eq!(result.body, json!("<testsuite/>"));
    assert!(result.log.is_none());
    assert!(!fs.exists("file.file".as_ref()), "result file must be consumed");
    assert!(executor.registry().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_empty_result_file_is_a_valid_body() -> TestResult {
    init_tracing();
    let (executor, _fs) = executor_with_files(&[("f", "")]);

    let result = executor
        .execute(r#"echo "{\"file\":\"f\",\"status\":200}""#, EXECUTION_TIMEOUT)
        .await;

    assert!(result.successful);
    assert_eq!(result.body, json!(""));
    Ok(())
}

#[tokio::test]
async fn test_file_without_status_or_flag_is_unsuccessful() -> TestResult {
    init_tracing();
    let (executor, _fs) = executor_with_files(&[("f", "")]);

    let result = executor
        .execute(r#"echo "{\"file\":\"f\"}""#, EXECUTION_TIMEOUT)
        .await;

    assert!(!result.successful);
    Ok(())
}

#[tokio::test]
async fn test_missing_file_field_is_unsuccessful() -> TestResult {
    init_tracing();
    let (executor, _fs) = executor_with_files(&[]);

    let result = executor.execute(r#"echo "{}""#, EXECUTION_TIMEOUT).await;

    assert!(!result.successful);
    let message = result.body["message"].as_str().unwrap_or_default();
    assert!(message.contains("missing the file field"), "got: {message}");
    Ok(())
}

#[tokio::test]
async fn test_complex_stdout_with_log_lines() -> TestResult {
    init_tracing();
    let (executor, _fs) = executor_with_files(&[("file.file", "<ok/>")]);

    let line1 = json!({"message": "This is a log message", "level": "debug"});
    let line2 = json!({"file": "file.file", "status": 200, "successful": true});
    let line3 = json!({"text": "some text"});
    let command = format!("printf '%s\\n' 'plain output' '{line1}' '{line2}' '{line3}'");

    let result = executor.execute(&command, EXECUTION_TIMEOUT).await;

    assert!(result.successful, "unexpected failure: {}", result.body);
    let log = result.log.expect("log entries");
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].level, "debug");
    assert_eq!(log[0].message, "This is a log message");
    Ok(())
}

#[tokio::test]
async fn test_timeout_kills_the_process() -> TestResult {
    init_tracing();
    let (executor, _fs) = executor_with_files(&[("file.file", "")]);

    let start = Instant::now();
    let result = with_timeout(executor.execute(
        &format!("sleep 3 && {}", echo_result(true, "file.file")),
        SHORT_TIMEOUT,
    ))
    .await;
    let elapsed = start.elapsed();

    assert!(!result.successful);
    assert!(
        elapsed < Duration::from_millis(1500),
        "execute returned after {elapsed:?}, expected roughly the timeout"
    );
    assert!(executor.registry().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_command_finishing_within_timeout_succeeds() -> TestResult {
    init_tracing();
    let (executor, _fs) = executor_with_files(&[("file.file", "")]);

    let result = executor
        .execute(
            &format!("sleep 0.05 && {}", echo_result(true, "file.file")),
            EXECUTION_TIMEOUT,
        )
        .await;

    assert!(result.successful);
    Ok(())
}

#[tokio::test]
async fn test_execute_does_not_block_the_caller() -> TestResult {
    init_tracing();
    let (executor, _fs) = executor_with_files(&[]);

    let start = Instant::now();
    let handle = tokio::spawn(async move { executor.execute("sleep 0.1", EXECUTION_TIMEOUT).await });
    assert!(start.elapsed() < Duration::from_millis(50));

    let result = with_timeout(handle).await?;
    assert!(!result.successful);
    Ok(())
}

#[tokio::test]
async fn test_abort_a_running_process() -> TestResult {
    init_tracing();
    let (executor, _fs) = executor_with_files(&[("file.file", "")]);

    let running = executor.clone();
    let command = format!("sleep 2 && {}", echo_result(true, "file.file"));
    let handle = tokio::spawn(async move { running.execute(&command, EXECUTION_TIMEOUT).await });

    wait_for_running(&executor, 1).await;
    assert_eq!(executor.abort_all_running_executions(), 1);

    let result = with_timeout(handle).await?;
    assert!(!result.successful);
    assert!(executor.registry().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_abort_four_running_processes() -> TestResult {
    init_tracing();
    let (executor, _fs) = executor_with_files(&[("file.file", "")]);

    let mut handles = Vec::new();
    for _ in 0..4 {
        let running = executor.clone();
        let command = format!("sleep 2 && {}", echo_result(true, "file.file"));
        handles.push(tokio::spawn(async move {
            running.execute(&command, EXECUTION_TIMEOUT).await
        }));
    }

    wait_for_running(&executor, 4).await;
    executor.abort_all_running_executions();
    assert!(executor.registry().is_empty());

    for handle in handles {
        let result = with_timeout(handle).await?;
        assert!(!result.successful);
    }
    Ok(())
}

#[tokio::test]
async fn test_abort_without_running_processes_is_a_noop() {
    let (executor, _fs) = executor_with_files(&[]);
    assert_eq!(executor.abort_all_running_executions(), 0);
    assert_eq!(executor.abort_all_running_executions(), 0);
}

#[tokio::test]
async fn test_failing_command_reports_the_error() -> TestResult {
    init_tracing();
    let (executor, _fs) = executor_with_files(&[]);

    let result = executor.execute(r#"echo2 "test""#, EXECUTION_TIMEOUT).await;

    assert!(!result.successful);
    assert_eq!(result.content_type.as_deref(), Some("application/json"));
    let error = result.body["error"].as_str().unwrap_or_default();
    assert!(error.contains(r#"command failed: echo2 "test""#), "got: {error}");
    assert!(result.body.get("stack").is_some());
    Ok(())
}

#[tokio::test]
async fn test_non_zero_exit_with_protocol_output_is_still_parsed() -> TestResult {
    init_tracing();
    let (executor, fs) = executor_with_files(&[("report.xml", "<failures/>")]);

    let command = format!("{}; exit 1", echo_result(false, "report.xml"));
    let result = executor.execute(&command, EXECUTION_TIMEOUT).await;

    assert!(!result.successful);
    assert_eq!(result.body, json!("<failures/>"));
    assert!(fs.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_missing_result_file_is_unsuccessful() -> TestResult {
    init_tracing();
    let (executor, _fs) = executor_with_files(&[]);

    let result = executor
        .execute(&echo_result(true, "does-not-exist.xml"), EXECUTION_TIMEOUT)
        .await;

    assert!(!result.successful);
    let error = result.body["error"].as_str().unwrap_or_default();
    assert!(error.contains("results file"), "got: {error}");
    Ok(())
}

#[tokio::test]
async fn test_no_protocol_output_is_unsuccessful() -> TestResult {
    init_tracing();
    let (executor, _fs) = executor_with_files(&[]);

    let result = executor.execute("echo hello", EXECUTION_TIMEOUT).await;

    assert!(!result.successful);
    assert!(matches!(result.body["error"], Value::String(ref s) if s.contains("hello")));
    Ok(())
}

#[tokio::test]
async fn test_reads_and_deletes_a_real_result_file() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("result.xml");
    let path_str = path.to_string_lossy().to_string();

    let executor = ProcessExecutor::default();
    let command = format!(
        "echo '<testsuite tests=\"1\"/>' > '{path_str}' && {}",
        echo_result(true, &path_str)
    );
    let result = executor.execute(&command, EXECUTION_TIMEOUT).await;

    assert!(result.successful, "unexpected failure: {}", result.body);
    assert_eq!(result.body, json!("<testsuite tests=\"1\"/>\n"));
    assert!(!path.exists());
    Ok(())
}
