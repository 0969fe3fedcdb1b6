//! backstop: client-side network resilience.
//!
//! Wraps outbound calls to a remote backend with request deduplication, a
//! circuit breaker, a bounded-concurrency admission queue, and retry with
//! capped exponential backoff. Purely in-process: a function-call API in
//! front of network I/O, with no wire format, persistence, or CLI surface.
//!
//! # Architecture Overview
//!
//! ```text
//!  caller ──▶ with_resilience(key, request, options)
//!                 │
//!                 ▼
//!          ┌─────────────┐   same key in flight?   ┌──────────────────┐
//!          │   dedupe    │────────────────────────▶│ join shared call │
//!          └──────┬──────┘                         └──────────────────┘
//!                 │ first caller for key
//!                 ▼
//!          ┌─────────────┐  open   ┌──────────────────┐
//!          │   circuit   │────────▶│ fail fast (no    │
//!          │   breaker   │         │ slot, no retry)  │
//!          └──────┬──────┘         └──────────────────┘
//!                 │ admit
//!                 ▼
//!          ┌─────────────┐  at cap ┌──────────────────┐
//!          │  admission  │────────▶│ park FIFO (High  │
//!          │    queue    │         │ bypasses the cap)│
//!          └──────┬──────┘         └──────────────────┘
//!                 │ slot held
//!                 ▼
//!          ┌─────────────────────────────────────────┐
//!          │ attempt loop: deadline → classify →     │
//!          │ backoff → retry                         │
//!          └──────┬──────────────────────────────────┘
//!                 ▼
//!          rolling metrics + breaker counters → health snapshot
//! ```
//!
//! # Example
//!
//! ```no_run
//! use backstop::{CallOptions, NetworkManager};
//!
//! # async fn demo() -> Result<(), backstop::Error> {
//! let manager = NetworkManager::default();
//! let record: String = manager
//!     .with_resilience(
//!         "fetch-project:42",
//!         || async { fetch_project(42).await },
//!         CallOptions::new(),
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! # async fn fetch_project(_id: u32) -> Result<String, std::io::Error> { Ok(String::new()) }
//! ```

// Core subsystems
pub mod config;
pub mod dedupe;
pub mod resilience;

// Cross-cutting concerns
pub mod error;
pub mod health;
pub mod observability;

pub use config::{ConfigError, ResilienceConfig};
pub use dedupe::Deduplicator;
pub use error::Error;
pub use health::NetworkHealth;
pub use resilience::{CallOptions, NetworkManager, Priority};
