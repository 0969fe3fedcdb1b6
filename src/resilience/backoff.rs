//! Exponential backoff with optional jitter.

use std::time::Duration;

use rand::Rng;

/// Delay before the retry that follows failed attempt `attempt` (0-based):
/// `min(base_ms * 2^attempt, max_ms)`, plus up to `jitter * delay` of random
/// extra delay when `jitter` is non-zero.
pub fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64, jitter: f64) -> Duration {
    let exponential = 2u64.saturating_pow(attempt);
    let delay_ms = base_ms.saturating_mul(exponential).min(max_ms);

    let jitter_range = (delay_ms as f64 * jitter) as u64;
    let jitter_ms = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(delay_ms + jitter_ms)
}
