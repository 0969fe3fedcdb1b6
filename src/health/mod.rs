//! Health tracking and reporting.
//!
//! # Data Flow
//! ```text
//! Request outcomes observed by the manager:
//!     → RollingMetrics (monotonic counters, process lifetime)
//!     → derived accessors (failure rate, average latency)
//!     → NetworkHealth snapshot (for dashboards / status indicators)
//! ```
//!
//! # Design Decisions
//! - Metrics accumulate for the process lifetime; only an explicit reset
//!   clears them
//! - Derivations are pure reads and never gate admission
//! - A failure rate below 0.3 with a closed breaker counts as healthy

use serde::Serialize;
use tokio::time::Instant;

/// Failure rate at or above which the layer reports itself unhealthy.
pub const HEALTHY_FAILURE_RATE: f64 = 0.3;

/// Monotonically accumulating request counters.
///
/// Both success and failure recording bump `request_count`; only successes
/// contribute response time, and only failures stamp `last_failure_at`.
#[derive(Debug, Default)]
pub struct RollingMetrics {
    request_count: u64,
    failure_count: u64,
    total_response_time_ms: u64,
    last_failure_at: Option<Instant>,
}

impl RollingMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&mut self, elapsed_ms: u64) {
        self.request_count += 1;
        self.total_response_time_ms += elapsed_ms;
    }

    pub fn record_failure(&mut self, now: Instant) {
        self.request_count += 1;
        self.failure_count += 1;
        self.last_failure_at = Some(now);
    }

    /// Fraction of recorded requests that failed; 0.0 before any request.
    pub fn failure_rate(&self) -> f64 {
        if self.request_count == 0 {
            0.0
        } else {
            self.failure_count as f64 / self.request_count as f64
        }
    }

    /// Mean response time over all recorded requests; 0.0 before any request.
    pub fn average_response_time_ms(&self) -> f64 {
        if self.request_count == 0 {
            0.0
        } else {
            self.total_response_time_ms as f64 / self.request_count as f64
        }
    }

    pub fn request_count(&self) -> u64 {
        self.request_count
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count
    }

    pub fn last_failure_at(&self) -> Option<Instant> {
        self.last_failure_at
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Point-in-time view of the resilience layer, safe to poll from a status
/// indicator.
#[derive(Debug, Clone, Serialize)]
pub struct NetworkHealth {
    pub is_healthy: bool,
    pub failure_rate: f64,
    pub avg_response_time_ms: f64,
    pub circuit_breaker_open: bool,
    pub active_requests: usize,
    pub queued_requests: usize,
}

impl NetworkHealth {
    /// Assemble a snapshot from its parts, deriving `is_healthy`.
    pub fn derive(
        metrics: &RollingMetrics,
        circuit_breaker_open: bool,
        active_requests: usize,
        queued_requests: usize,
    ) -> Self {
        let failure_rate = metrics.failure_rate();
        Self {
            is_healthy: !circuit_breaker_open && failure_rate < HEALTHY_FAILURE_RATE,
            failure_rate,
            avg_response_time_ms: metrics.average_response_time_ms(),
            circuit_breaker_open,
            active_requests,
            queued_requests,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rates_are_zero_before_any_request() {
        let metrics = RollingMetrics::new();
        assert_eq!(metrics.failure_rate(), 0.0);
        assert_eq!(metrics.average_response_time_ms(), 0.0);
    }

    #[tokio::test]
    async fn failure_rate_counts_failures_against_all_requests() {
        let mut metrics = RollingMetrics::new();
        for _ in 0..3 {
            metrics.record_success(100);
        }
        metrics.record_failure(Instant::now());

        assert_eq!(metrics.request_count(), 4);
        assert_eq!(metrics.failure_rate(), 0.25);
        // 300ms of latency spread over 4 requests
        assert_eq!(metrics.average_response_time_ms(), 75.0);
        assert!(metrics.last_failure_at().is_some());
    }

    #[tokio::test]
    async fn reset_clears_everything() {
        let mut metrics = RollingMetrics::new();
        metrics.record_failure(Instant::now());
        metrics.reset();

        assert_eq!(metrics.request_count(), 0);
        assert_eq!(metrics.failure_rate(), 0.0);
        assert!(metrics.last_failure_at().is_none());
    }

    #[tokio::test]
    async fn health_derivation_thresholds() {
        let mut metrics = RollingMetrics::new();
        for _ in 0..7 {
            metrics.record_success(10);
        }
        for _ in 0..3 {
            metrics.record_failure(Instant::now());
        }

        // 30% failure rate is already unhealthy
        let health = NetworkHealth::derive(&metrics, false, 2, 0);
        assert!(!health.is_healthy);

        metrics.record_success(10);
        let health = NetworkHealth::derive(&metrics, false, 2, 0);
        assert!(health.is_healthy);

        // an open breaker is unhealthy regardless of rate
        let health = NetworkHealth::derive(&metrics, true, 0, 0);
        assert!(!health.is_healthy);
    }

    #[tokio::test]
    async fn snapshot_serializes_for_dashboards() {
        let metrics = RollingMetrics::new();
        let health = NetworkHealth::derive(&metrics, false, 1, 2);
        let json = serde_json::to_value(&health).unwrap();
        assert_eq!(json["is_healthy"], true);
        assert_eq!(json["active_requests"], 1);
        assert_eq!(json["queued_requests"], 2);
    }
}
