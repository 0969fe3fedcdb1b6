//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files, and
//! every field has a default so a minimal (or empty) config is valid.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tunable thresholds for the resilience layer.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ResilienceConfig {
    /// Maximum simultaneous in-flight executions across all callers.
    /// High-priority calls may exceed this (see `Priority::High`).
    pub max_concurrent_requests: usize,

    /// Failures (net of decay) required to open the circuit breaker.
    pub failure_threshold: u32,

    /// How long the breaker stays open before the next request is let
    /// through as a live probe.
    pub recovery_timeout_ms: u64,

    /// Per-attempt deadline applied when a call does not specify its own.
    pub default_timeout_ms: u64,

    /// Retry budget applied when a call does not specify its own.
    pub default_retries: u32,

    /// Base delay before the first retry; doubles each attempt.
    pub backoff_base_ms: u64,

    /// Ceiling on any single backoff delay.
    pub backoff_max_ms: u64,

    /// Fraction of the delay added as random jitter, in `[0.0, 1.0]`.
    /// Zero keeps the backoff schedule deterministic.
    pub backoff_jitter: f64,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: 10,
            failure_threshold: 5,
            recovery_timeout_ms: 30_000,
            default_timeout_ms: 15_000,
            default_retries: 2,
            backoff_base_ms: 1_000,
            backoff_max_ms: 5_000,
            backoff_jitter: 0.0,
        }
    }
}

impl ResilienceConfig {
    /// Recovery window as a [`Duration`].
    pub fn recovery_timeout(&self) -> Duration {
        Duration::from_millis(self.recovery_timeout_ms)
    }

    /// Default per-attempt deadline as a [`Duration`].
    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }
}
