//! Shared utilities for the integration suite.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Install a test subscriber once; later calls are no-ops.
#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

type BoxedRequest =
    Pin<Box<dyn Future<Output = Result<u32, String>> + Send + 'static>>;

/// An operation that fails `failures` times with `message`, then succeeds
/// with the invocation number. Returns the operation and its call counter.
#[allow(dead_code)]
pub fn flaky_request(
    failures: u32,
    message: &'static str,
) -> (
    impl Send + Sync + 'static + Fn() -> BoxedRequest,
    Arc<AtomicU32>,
) {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);
    let request = move || -> BoxedRequest {
        let counter = Arc::clone(&counter);
        Box::pin(async move {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            if n <= failures {
                Err(message.to_string())
            } else {
                Ok(n)
            }
        })
    };
    (request, calls)
}

/// Yield repeatedly so spawned tasks can make progress without advancing
/// the (possibly paused) clock.
#[allow(dead_code)]
pub async fn settle() {
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }
}
