pub mod builders;
pub mod fake_runner;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Upper bound for any single awaited step in a test.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Initialise tracing for tests.
///
/// Output goes through `with_test_writer()`, so it only shows up for failing
/// tests (or with `-- --nocapture`). The filter comes from `RUST_LOG`, then
/// `TEST_EXECUTOR_LOG`, and defaults to `info`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_from_env("TEST_EXECUTOR_LOG"))
            .unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Await `f`, failing the test after [`TEST_TIMEOUT`].
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    tokio::time::timeout(TEST_TIMEOUT, f)
        .await
        .expect("test step timed out")
}

/// Poll `condition` every few milliseconds until it holds.
///
/// Panics with `what` if it doesn't within [`TEST_TIMEOUT`].
pub async fn wait_until(what: &str, mut condition: impl FnMut() -> bool) {
    let poll = async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    };

    if tokio::time::timeout(TEST_TIMEOUT, poll).await.is_err() {
        panic!("timed out waiting until {what}");
    }
}
