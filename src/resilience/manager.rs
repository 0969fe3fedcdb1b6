//! Resilient call orchestration.
//!
//! # Data Flow
//! ```text
//! with_resilience(key, request, options)
//!     → dedupe (join an in-flight call under the same key, or start one)
//!     → circuit breaker gate (fail fast while open)
//!     → admission queue (run now / park FIFO / high-priority bypass)
//!     → attempt loop: deadline race → classify → backoff → retry
//!     → outcome recorded once into rolling metrics + breaker counters
//! ```

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;

use crate::config::ResilienceConfig;
use crate::dedupe::Deduplicator;
use crate::error::Error;
use crate::health::{NetworkHealth, RollingMetrics};
use crate::observability::metrics;
use crate::resilience::circuit_breaker::CircuitBreaker;
use crate::resilience::queue::{AdmissionQueue, Priority};
use crate::resilience::{backoff, retries, timeouts};

/// Per-call knobs. Unset fields fall back to the manager's config.
#[derive(Debug, Clone, Copy, Default)]
pub struct CallOptions {
    pub priority: Priority,
    pub timeout: Option<Duration>,
    pub retries: Option<u32>,
}

impl CallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = Some(retries);
        self
    }

    /// Shorthand for the soft-cap bypass used by latency-critical calls.
    pub fn high_priority() -> Self {
        Self::new().with_priority(Priority::High)
    }
}

/// Wraps outbound backend calls with deduplication, circuit breaking,
/// bounded concurrency, and retry with capped exponential backoff.
///
/// Explicitly constructed and cheap to clone; clones share all state, so
/// tests and applications create as many isolated instances as they need
/// instead of going through a process-wide singleton.
#[derive(Clone, Default)]
pub struct NetworkManager {
    inner: Arc<ManagerInner>,
}

struct ManagerInner {
    config: ResilienceConfig,
    breaker: Mutex<CircuitBreaker>,
    metrics: Mutex<RollingMetrics>,
    queue: Arc<AdmissionQueue>,
    dedupe: Deduplicator,
}

impl Default for ManagerInner {
    fn default() -> Self {
        Self::with_config(ResilienceConfig::default())
    }
}

impl ManagerInner {
    fn with_config(config: ResilienceConfig) -> Self {
        Self {
            breaker: Mutex::new(CircuitBreaker::new(
                config.failure_threshold,
                config.recovery_timeout(),
            )),
            metrics: Mutex::new(RollingMetrics::new()),
            queue: Arc::new(AdmissionQueue::new(config.max_concurrent_requests)),
            dedupe: Deduplicator::new(),
            config,
        }
    }
}

impl NetworkManager {
    /// Build a manager from a (validated) config. See
    /// [`crate::config::loader::load_config`] for file-based setup.
    pub fn new(config: ResilienceConfig) -> Self {
        Self { inner: Arc::new(ManagerInner::with_config(config)) }
    }

    pub fn config(&self) -> &ResilienceConfig {
        &self.inner.config
    }

    /// Run `request` under the full resilience pipeline.
    ///
    /// `key` identifies logically-identical calls: concurrent calls with the
    /// same key share a single execution and its outcome. Keys that collide
    /// across semantically different calls will incorrectly share results.
    ///
    /// `request` is an opaque async operation; it may be invoked several
    /// times (retries), and its error's display text drives retry
    /// classification.
    pub async fn with_resilience<T, E, F, Fut>(
        &self,
        key: &str,
        request: F,
        options: CallOptions,
    ) -> Result<T, Error>
    where
        T: Clone + Send + Sync + 'static,
        E: std::fmt::Display,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let manager = self.clone();
        let owned_key = key.to_string();
        self.inner
            .dedupe
            .run(key, move || async move {
                manager.execute(owned_key, request, options).await
            })
            .await
    }

    /// Coalesce concurrent identical calls without the resilience pipeline
    /// (no breaker, no queue, no retries). Useful for cache-style reads
    /// that already have their own failure handling.
    pub async fn dedupe<T, E, F, Fut>(&self, key: &str, request: F) -> Result<T, Error>
    where
        T: Clone + Send + Sync + 'static,
        E: std::fmt::Display,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        self.inner.dedupe.dedupe(key, request).await
    }

    async fn execute<T, E, F, Fut>(
        self,
        key: String,
        request: F,
        options: CallOptions,
    ) -> Result<T, Error>
    where
        T: Clone + Send + Sync + 'static,
        E: std::fmt::Display,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        {
            let mut breaker = self.inner.breaker.lock().expect("breaker mutex poisoned");
            if let Err(err) = breaker.check_admission(Instant::now()) {
                drop(breaker);
                metrics::record_rejection("circuit_open");
                tracing::debug!(key = %key, "Request refused: circuit breaker open");
                return Err(err);
            }
        }

        let _slot = self.inner.queue.acquire(options.priority).await;

        let timeout = options
            .timeout
            .unwrap_or_else(|| self.inner.config.default_timeout());
        let retry_budget = options.retries.unwrap_or(self.inner.config.default_retries);

        let started = Instant::now();
        let mut attempt: u32 = 0;
        loop {
            let outcome = timeouts::with_deadline(timeout, async {
                request().await.map_err(Error::upstream)
            })
            .await;

            let err = match outcome {
                Ok(value) => {
                    self.record_success(started.elapsed());
                    tracing::trace!(key = %key, attempt, "Request succeeded");
                    return Ok(value);
                }
                Err(err) => err,
            };

            tracing::warn!(key = %key, attempt, error = %err, "Request attempt failed");

            if !retries::is_retryable(&err) {
                tracing::debug!(key = %key, "Error is not retryable, giving up");
                self.record_failure();
                return Err(err);
            }
            if attempt >= retry_budget {
                self.record_failure();
                return Err(err);
            }

            metrics::record_retry();
            let delay = backoff::calculate_backoff(
                attempt,
                self.inner.config.backoff_base_ms,
                self.inner.config.backoff_max_ms,
                self.inner.config.backoff_jitter,
            );
            tokio::time::sleep(delay).await;

            // a concurrent failure may have tripped the breaker while this
            // call was backing off; stop hammering an open circuit
            if self.circuit_open() {
                tracing::debug!(key = %key, "Circuit opened mid-retry, abandoning attempts");
                self.record_failure();
                return Err(err);
            }
            attempt += 1;
        }
    }

    fn record_success(&self, elapsed: Duration) {
        let elapsed_ms = elapsed.as_millis() as u64;
        self.inner
            .metrics
            .lock()
            .expect("metrics mutex poisoned")
            .record_success(elapsed_ms);
        self.inner
            .breaker
            .lock()
            .expect("breaker mutex poisoned")
            .on_success();
        metrics::record_success(elapsed_ms);
    }

    fn record_failure(&self) {
        let now = Instant::now();
        self.inner
            .metrics
            .lock()
            .expect("metrics mutex poisoned")
            .record_failure(now);
        self.inner
            .breaker
            .lock()
            .expect("breaker mutex poisoned")
            .on_failure(now);
        metrics::record_failure();
    }

    fn circuit_open(&self) -> bool {
        self.inner
            .breaker
            .lock()
            .expect("breaker mutex poisoned")
            .is_open(Instant::now())
    }

    /// Fraction of recorded requests that failed.
    pub fn failure_rate(&self) -> f64 {
        self.inner
            .metrics
            .lock()
            .expect("metrics mutex poisoned")
            .failure_rate()
    }

    /// Mean response time in milliseconds over all recorded requests.
    pub fn average_response_time(&self) -> f64 {
        self.inner
            .metrics
            .lock()
            .expect("metrics mutex poisoned")
            .average_response_time_ms()
    }

    /// Point-in-time health snapshot for dashboards and status indicators.
    pub fn network_health(&self) -> NetworkHealth {
        let rolling = self.inner.metrics.lock().expect("metrics mutex poisoned");
        NetworkHealth::derive(
            &rolling,
            self.circuit_open(),
            self.inner.queue.active_count(),
            self.inner.queue.queue_len(),
        )
    }

    /// Current in-flight executions (including high-priority bypasses).
    pub fn active_request_count(&self) -> usize {
        self.inner.queue.active_count()
    }

    /// Deferred executions waiting for a concurrency slot.
    pub fn queue_length(&self) -> usize {
        self.inner.queue.queue_len()
    }

    /// Live entries in the deduplication table.
    pub fn in_flight_count(&self) -> usize {
        self.inner.dedupe.in_flight_count()
    }

    /// Zero the rolling metrics and force the breaker closed. An operator
    /// and test escape hatch; never called automatically.
    pub fn reset_metrics(&self) {
        self.inner
            .metrics
            .lock()
            .expect("metrics mutex poisoned")
            .reset();
        self.inner
            .breaker
            .lock()
            .expect("breaker mutex poisoned")
            .reset();
        tracing::info!("Resilience metrics reset");
    }
}
