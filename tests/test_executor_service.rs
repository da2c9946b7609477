// tests/test_executor_service.rs

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use test_executor::errors::TestExecutorError;
use test_executor::result::ExecutionResult;
use test_executor::scheduler::TimeOptions;
use test_executor::service::{TestExecutor, DEFAULT_PAUSE, STATUS_OK, STATUS_UNAVAILABLE};
use test_executor_test_utils::builders::executor_settings;
use test_executor_test_utils::fake_runner::{
    failed_result, numbered_result, numbered_results, ScriptedRunner, Step,
};
use test_executor_test_utils::init_tracing;
use tokio::time::sleep;

const RUN_DURATION: Duration = Duration::from_millis(100);

fn service(runner: &ScriptedRunner) -> TestExecutor {
    TestExecutor::new(executor_settings("run-tests"), Arc::new(runner.clone()))
}

fn options() -> TimeOptions {
    TimeOptions::new(Duration::from_secs(60), Duration::from_secs(10))
}

#[tokio::test(start_paused = true)]
async fn test_execute_now_maps_success_to_200_with_default_content_type() {
    init_tracing();
    let runner = ScriptedRunner::with_results(vec![numbered_result(0)], RUN_DURATION);

    let response = service(&runner).execute_now().await;

    assert_eq!(response.status, STATUS_OK);
    assert!(response.is_success());
    assert_eq!(response.content_type, "content/type");
    assert_eq!(response.body, json!({ "test": 0 }));
}

#[tokio::test(start_paused = true)]
async fn test_execute_now_maps_failure_to_503() {
    init_tracing();
    let runner = ScriptedRunner::with_results(vec![failed_result("x")], RUN_DURATION);

    let response = service(&runner).execute_now().await;

    assert_eq!(response.status, STATUS_UNAVAILABLE);
    assert_eq!(response.body, json!({ "test": "x" }));
}

#[tokio::test(start_paused = true)]
async fn test_result_content_type_wins_over_default() {
    init_tracing();
    let runner = ScriptedRunner::with_results(
        vec![ExecutionResult::failure(json!({ "message": "nope" }))],
        RUN_DURATION,
    );

    let response = service(&runner).execute_now().await;

    assert_eq!(response.status, STATUS_UNAVAILABLE);
    assert_eq!(response.content_type, "application/json");
}

#[tokio::test(start_paused = true)]
async fn test_execute_now_turns_runner_errors_into_503() {
    init_tracing();
    let runner = ScriptedRunner::new(vec![Step::Fault("spawn failed".into())], RUN_DURATION);

    let response = service(&runner).execute_now().await;

    assert_eq!(response.status, STATUS_UNAVAILABLE);
    assert_eq!(response.body["error"], json!("spawn failed"));
}

#[tokio::test]
async fn test_runner_operations_before_start_fail() {
    let runner = ScriptedRunner::new(Vec::new(), RUN_DURATION);
    let service = service(&runner);

    assert!(matches!(
        service.last_result(),
        Err(TestExecutorError::RunnerNotStarted)
    ));
    assert!(matches!(
        service.last_result_response(),
        Err(TestExecutorError::RunnerNotStarted)
    ));
    assert!(matches!(
        service.pause_async_runner(None),
        Err(TestExecutorError::RunnerNotStarted)
    ));
    assert!(matches!(
        service.resume_async_runner(),
        Err(TestExecutorError::RunnerNotStarted)
    ));
    assert!(matches!(service.stop(), Err(TestExecutorError::RunnerNotStarted)));
}

#[tokio::test(start_paused = true)]
async fn test_async_runner_can_only_be_started_once() {
    init_tracing();
    let runner = ScriptedRunner::with_results(numbered_results(1), RUN_DURATION);
    let service = service(&runner);

    service.start_async_runner(options()).expect("first start");
    let err = service.start_async_runner(options()).unwrap_err();

    assert!(matches!(err, TestExecutorError::RunnerAlreadyStarted));
    assert!(err.to_string().contains("already an instance of the async runner"));

    settle().await;
    assert_eq!(runner.call_count(), 1, "the second start must not spawn another runner");
}

#[tokio::test(start_paused = true)]
async fn test_last_result_response_before_first_run_is_the_sentinel() {
    init_tracing();
    let runner = ScriptedRunner::with_results(numbered_results(1), RUN_DURATION);
    let service = service(&runner);
    service.start_async_runner(options()).unwrap();

    let response = service.last_result_response().unwrap();

    assert_eq!(response.status, STATUS_OK);
    assert_eq!(response.content_type, "application/json");
    assert_eq!(
        response.body["message"],
        json!("There is no completed test run yet, the first test is still running")
    );
    assert!(response.test_start.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_last_result_response_carries_test_times() {
    init_tracing();
    let runner = ScriptedRunner::with_results(numbered_results(1), RUN_DURATION);
    let service = service(&runner);
    service.start_async_runner(options()).unwrap();

    sleep(RUN_DURATION * 2).await;
    let response = service.last_result_response().unwrap();

    assert_eq!(response.status, STATUS_OK);
    assert_eq!(response.content_type, "content/type");
    assert_eq!(response.body, json!({ "test": 0 }));
    let (start, end) = (response.test_start.unwrap(), response.test_end.unwrap());
    assert!(start <= end);
}

#[tokio::test(start_paused = true)]
async fn test_pause_without_duration_uses_the_default_window() {
    init_tracing();
    let runner = ScriptedRunner::with_results(numbered_results(2), RUN_DURATION);
    let service = service(&runner);
    service.start_async_runner(options()).unwrap();
    sleep(RUN_DURATION * 2).await;

    service.pause_async_runner(None).unwrap();

    sleep(DEFAULT_PAUSE - Duration::from_secs(1)).await;
    assert_eq!(runner.call_count(), 1);

    sleep(Duration::from_secs(2)).await;
    assert_eq!(runner.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_configured_default_pause_is_used() {
    init_tracing();
    let runner = ScriptedRunner::with_results(numbered_results(2), RUN_DURATION);
    let service = service(&runner).with_default_pause(Duration::from_secs(30));
    service.start_async_runner(options()).unwrap();
    sleep(RUN_DURATION * 2).await;

    service.pause_async_runner(None).unwrap();
    sleep(Duration::from_secs(31)).await;

    assert_eq!(runner.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_resume_through_the_service_runs_immediately() {
    init_tracing();
    let runner = ScriptedRunner::with_results(numbered_results(2), RUN_DURATION);
    let service = service(&runner);
    service.start_async_runner(options()).unwrap();

    service.pause_async_runner(Some(Duration::from_secs(600))).unwrap();
    settle().await;
    service.resume_async_runner().unwrap();
    settle().await;

    assert_eq!(runner.call_count(), 2);
    assert_eq!(runner.abort_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_stop_is_final() {
    init_tracing();
    let runner = ScriptedRunner::with_results(numbered_results(2), RUN_DURATION);
    let service = service(&runner);
    service.start_async_runner(options()).unwrap();
    sleep(RUN_DURATION * 2).await;

    service.stop().unwrap();
    sleep(Duration::from_secs(120)).await;

    assert_eq!(runner.call_count(), 1);
    assert!(matches!(
        service.start_async_runner(options()),
        Err(TestExecutorError::RunnerAlreadyStarted)
    ));
}

async fn settle() {
    sleep(Duration::from_millis(1)).await;
}
