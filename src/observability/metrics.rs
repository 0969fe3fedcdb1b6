//! Metrics collection.
//!
//! # Metrics
//! - `backstop_requests_total` (counter): completed requests by outcome
//! - `backstop_request_duration_ms` (histogram): successful-call latency
//! - `backstop_retries_total` (counter): retry attempts scheduled
//! - `backstop_rejections_total` (counter): admission refusals by reason
//! - `backstop_circuit_open` (gauge): 1 = open, 0 = closed
//! - `backstop_active_requests` (gauge): current in-flight executions
//! - `backstop_queue_depth` (gauge): deferred executions waiting for a slot
//! - `backstop_dedupe_total` (counter): dedup lookups by result
//!
//! # Design Decisions
//! - Uses the `metrics` facade only; recorder installation is the host
//!   application's concern
//! - Updates are cheap and unconditional (no-ops without a recorder)

use metrics::{counter, gauge, histogram};

pub fn record_success(elapsed_ms: u64) {
    counter!("backstop_requests_total", "outcome" => "success").increment(1);
    histogram!("backstop_request_duration_ms").record(elapsed_ms as f64);
}

pub fn record_failure() {
    counter!("backstop_requests_total", "outcome" => "failure").increment(1);
}

pub fn record_retry() {
    counter!("backstop_retries_total").increment(1);
}

pub fn record_rejection(reason: &'static str) {
    counter!("backstop_rejections_total", "reason" => reason).increment(1);
}

pub fn record_circuit_state(open: bool) {
    gauge!("backstop_circuit_open").set(if open { 1.0 } else { 0.0 });
}

pub fn record_active_requests(count: usize) {
    gauge!("backstop_active_requests").set(count as f64);
}

pub fn record_queue_depth(depth: usize) {
    gauge!("backstop_queue_depth").set(depth as f64);
}

pub fn record_dedupe(result: &'static str) {
    counter!("backstop_dedupe_total", "result" => result).increment(1);
}
