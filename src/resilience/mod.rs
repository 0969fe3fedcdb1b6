//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to backend:
//!     → circuit_breaker.rs (fail fast while the backend is assumed down)
//!     → queue.rs (bounded concurrency; FIFO deferral; priority bypass)
//!     → timeouts.rs (enforce per-attempt deadline)
//!     → On failure: retries.rs (check if retryable) + backoff.rs (delay)
//!     → manager.rs (orchestrates the above, records metrics)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every attempt has a deadline
//! - Retries only for transient failures; caller errors fail fast
//! - Circuit breaker prevents cascading failures during an outage
//! - All admission state lives in one place so it survives no restarts
//!   and needs no cross-process coordination

pub mod backoff;
pub mod circuit_breaker;
pub mod manager;
pub mod queue;
pub mod retries;
pub mod timeouts;

pub use manager::{CallOptions, NetworkManager};
pub use queue::Priority;
