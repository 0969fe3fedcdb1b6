//! Request deduplication (in-flight coalescing).
//!
//! # Data Flow
//! ```text
//! dedupe(key, request)
//!     → live entry under key?  join it, share its eventual outcome
//!     → otherwise: run request on its own task, publish the shared future,
//!       remove the table entry when it settles (success or failure)
//! ```
//!
//! # Design Decisions
//! - The underlying call runs on a spawned task, so it settles (and the
//!   table entry is removed) even if every subscriber goes away
//! - One table serves responses of many types; stored values are
//!   type-erased and downcast on the way out, so a key reused across types
//!   surfaces as an explicit error instead of silently shared garbage
//! - Errors are shared verbatim with every subscriber; nothing is wrapped
//!   or suppressed on the failure path

use std::any::Any;
use std::future::Future;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures_util::future::{BoxFuture, Shared};
use futures_util::FutureExt;

use crate::error::Error;
use crate::observability::metrics;

type StoredValue = Arc<dyn Any + Send + Sync>;
type SharedOutcome = Shared<BoxFuture<'static, Result<StoredValue, Error>>>;

/// Collapses concurrent identical requests (same key) into one underlying
/// call. Cheap to clone; clones share the in-flight table.
#[derive(Clone, Default)]
pub struct Deduplicator {
    in_flight: Arc<DashMap<String, SharedOutcome>>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `request` under `key`, or join the in-flight call already
    /// running under it. Every subscriber receives the same value (or the
    /// same error); `request` is invoked at most once per live key.
    pub async fn dedupe<T, E, F, Fut>(&self, key: &str, request: F) -> Result<T, Error>
    where
        T: Clone + Send + Sync + 'static,
        E: std::fmt::Display,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        self.run(key, move || {
            let operation = request();
            async move { operation.await.map_err(Error::upstream) }
        })
        .await
    }

    /// Core entry point for callers whose operation already speaks this
    /// crate's error type (the resilience pipeline), so admission refusals
    /// and timeouts are shared with joiners unchanged.
    pub(crate) async fn run<T, F, Fut>(&self, key: &str, request: F) -> Result<T, Error>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, Error>> + Send + 'static,
    {
        let shared = match self.in_flight.entry(key.to_string()) {
            Entry::Occupied(entry) => {
                metrics::record_dedupe("hit");
                tracing::trace!(key, "Joining in-flight request");
                entry.get().clone()
            }
            Entry::Vacant(entry) => {
                metrics::record_dedupe("miss");
                let shared = self.start(key, request());
                entry.insert(shared.clone());
                shared
            }
        };

        let stored = shared.await?;
        match stored.downcast::<T>() {
            Ok(value) => Ok(value.as_ref().clone()),
            Err(_) => Err(Error::KeyTypeConflict(key.to_string())),
        }
    }

    /// Live entries in the in-flight table.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    fn start<T, Fut>(&self, key: &str, operation: Fut) -> SharedOutcome
    where
        T: Send + Sync + 'static,
        Fut: Future<Output = Result<T, Error>> + Send + 'static,
    {
        let cleanup = RemoveOnSettle {
            table: Arc::clone(&self.in_flight),
            key: key.to_string(),
        };
        let task = tokio::spawn(async move {
            let _cleanup = cleanup;
            operation.await.map(|value| Arc::new(value) as StoredValue)
        });

        async move {
            match task.await {
                Ok(result) => result,
                Err(join_err) => Err(Error::upstream(format!("request task failed: {join_err}"))),
            }
        }
        .boxed()
        .shared()
    }
}

/// Removes a key when its call settles, whether by value, error, or panic.
/// The removal blocks on the table shard until the caller has inserted the
/// entry, so cleanup can never race ahead of insert.
struct RemoveOnSettle {
    table: Arc<DashMap<String, SharedOutcome>>,
    key: String,
}

impl Drop for RemoveOnSettle {
    fn drop(&mut self) {
        self.table.remove(&self.key);
    }
}
