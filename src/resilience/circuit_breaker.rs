//! Circuit breaker for backend protection.
//!
//! # States
//! - Closed: normal operation, requests pass through
//! - Open: backend assumed down, requests fail fast
//!
//! # State Transitions
//! ```text
//! Closed → Open: decaying failure_count >= failure_threshold
//! Open → Closed: recovery timeout elapsed at the next admission check
//! ```
//!
//! # Design Decisions
//! - No half-open state: once the recovery window elapses the breaker
//!   closes outright and the next request acts as the live probe. A failed
//!   probe reopens the breaker only when the counter breaches the
//!   threshold again.
//! - The failure counter decays: +1 per failure, −1 per success, floored
//!   at 0, so a brief blip does not trip the breaker but sustained failure
//!   does.
//! - Successes never close an open breaker; only elapsed time does.

use std::time::Duration;

use tokio::time::Instant;

use crate::error::Error;
use crate::observability::metrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Closed,
    Open { opened_at: Instant },
}

/// Two-state breaker with a decaying failure counter.
///
/// Pure state machine over an injected clock value; the caller passes `now`
/// so transitions are unit-testable without sleeping.
#[derive(Debug)]
pub struct CircuitBreaker {
    failure_threshold: u32,
    recovery_timeout: Duration,
    state: State,
    failure_count: u32,
    last_failure_at: Option<Instant>,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32, recovery_timeout: Duration) -> Self {
        Self {
            failure_threshold,
            recovery_timeout,
            state: State::Closed,
            failure_count: 0,
            last_failure_at: None,
        }
    }

    /// Gate a new request. Closed admits; open admits only once the
    /// recovery window has elapsed, closing the breaker on the way through.
    pub fn check_admission(&mut self, now: Instant) -> Result<(), Error> {
        match self.state {
            State::Closed => Ok(()),
            State::Open { opened_at } => {
                if now.duration_since(opened_at) >= self.recovery_timeout {
                    tracing::info!("Circuit breaker recovery window elapsed, closing");
                    self.close();
                    Ok(())
                } else {
                    Err(Error::CircuitOpen)
                }
            }
        }
    }

    /// Record a successful call: decay the failure counter (floor 0).
    pub fn on_success(&mut self) {
        self.failure_count = self.failure_count.saturating_sub(1);
    }

    /// Record a failed call; trips the breaker at the threshold.
    pub fn on_failure(&mut self, now: Instant) {
        self.failure_count += 1;
        self.last_failure_at = Some(now);

        if self.state == State::Closed && self.failure_count >= self.failure_threshold {
            self.state = State::Open { opened_at: now };
            metrics::record_circuit_state(true);
            tracing::warn!(
                failures = self.failure_count,
                recovery_secs = self.recovery_timeout.as_secs(),
                "Circuit breaker opened"
            );
        }
    }

    /// Whether the breaker currently refuses admissions. False once the
    /// recovery window has elapsed, even before the closing transition runs.
    pub fn is_open(&self, now: Instant) -> bool {
        match self.state {
            State::Closed => false,
            State::Open { opened_at } => now.duration_since(opened_at) < self.recovery_timeout,
        }
    }

    pub fn failure_count(&self) -> u32 {
        self.failure_count
    }

    pub fn last_failure_at(&self) -> Option<Instant> {
        self.last_failure_at
    }

    /// Force the breaker back to its initial closed state.
    pub fn reset(&mut self) {
        self.close();
        self.last_failure_at = None;
    }

    fn close(&mut self) {
        self.state = State::Closed;
        self.failure_count = 0;
        metrics::record_circuit_state(false);
    }
}
