//! Bounded concurrency with a priority-aware admission queue.
//!
//! # Responsibilities
//! - Cap simultaneous in-flight executions at a global maximum
//! - Park overflow callers in FIFO order until a slot frees
//! - Let high-priority callers bypass both queue and cap
//!
//! # Design Decisions
//! - Slot lifecycle is RAII: dropping the guard frees the slot and drains
//!   the queue, so a slot cannot leak on any return path
//! - Queue and counter share one mutex, which is what keeps admission
//!   atomic and FIFO under a multi-threaded runtime
//! - The high-priority bypass makes the cap soft by design: it is an
//!   escape valve for latency-critical calls, not a strict bound

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::oneshot;

use crate::observability::metrics;

/// Scheduling class for a resilient call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Priority {
    /// Runs immediately, even over the concurrency cap.
    High,
    /// Runs within the cap; queues FIFO when the cap is reached.
    #[default]
    Normal,
    /// Currently scheduled exactly like `Normal`; reserved for future
    /// shedding policy.
    Low,
}

/// FIFO admission queue guarding a global concurrency cap.
#[derive(Debug)]
pub struct AdmissionQueue {
    max_concurrent: usize,
    active: AtomicUsize,
    waiters: Mutex<VecDeque<oneshot::Sender<SlotGuard>>>,
}

impl AdmissionQueue {
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            max_concurrent,
            active: AtomicUsize::new(0),
            waiters: Mutex::new(VecDeque::new()),
        }
    }

    /// Acquire an execution slot, parking FIFO when the cap is reached.
    /// High priority claims a slot immediately regardless of the cap.
    pub async fn acquire(self: &Arc<Self>, priority: Priority) -> SlotGuard {
        if priority == Priority::High {
            self.active.fetch_add(1, Ordering::SeqCst);
            metrics::record_active_requests(self.active_count());
            tracing::debug!("High-priority request bypassing admission queue");
            return SlotGuard::claim(self);
        }

        let parked = {
            let mut waiters = self.waiters.lock().expect("admission queue mutex poisoned");
            if self.active.load(Ordering::SeqCst) < self.max_concurrent {
                self.active.fetch_add(1, Ordering::SeqCst);
                None
            } else {
                let (tx, rx) = oneshot::channel();
                waiters.push_back(tx);
                metrics::record_queue_depth(waiters.len());
                tracing::debug!(queued = waiters.len(), "Concurrency cap reached, request deferred");
                Some(rx)
            }
        };

        match parked {
            None => {
                metrics::record_active_requests(self.active_count());
                SlotGuard::claim(self)
            }
            Some(rx) => match rx.await {
                Ok(guard) => guard,
                // queue dropped out from under us; claim the slot directly
                Err(_) => {
                    self.active.fetch_add(1, Ordering::SeqCst);
                    SlotGuard::claim(self)
                }
            },
        }
    }

    /// Current in-flight executions (including high-priority bypasses).
    pub fn active_count(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Deferred executions waiting for a slot.
    pub fn queue_len(&self) -> usize {
        self.waiters
            .lock()
            .map(|waiters| waiters.len())
            .unwrap_or(0)
    }

    /// Free one slot and hand freed capacity to parked waiters in FIFO
    /// order, skipping waiters whose caller has gone away.
    fn release(self: &Arc<Self>) {
        let mut waiters = self.waiters.lock().expect("admission queue mutex poisoned");
        self.active.fetch_sub(1, Ordering::SeqCst);

        while self.active.load(Ordering::SeqCst) < self.max_concurrent {
            let Some(tx) = waiters.pop_front() else { break };
            self.active.fetch_add(1, Ordering::SeqCst);
            if let Err(mut unclaimed) = tx.send(SlotGuard::claim(self)) {
                // receiver dropped between parking and handoff; undo the
                // claim without re-entering release
                unclaimed.queue = None;
                self.active.fetch_sub(1, Ordering::SeqCst);
            }
        }

        metrics::record_queue_depth(waiters.len());
        metrics::record_active_requests(self.active.load(Ordering::SeqCst));
    }
}

/// Holds one execution slot; freed (and the queue drained) on drop.
#[derive(Debug)]
pub struct SlotGuard {
    queue: Option<Arc<AdmissionQueue>>,
}

impl SlotGuard {
    /// Wrap an already-incremented slot. The counter bump happens at the
    /// claim site so admission stays atomic under the queue lock.
    fn claim(queue: &Arc<AdmissionQueue>) -> Self {
        Self { queue: Some(Arc::clone(queue)) }
    }
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        if let Some(queue) = self.queue.take() {
            queue.release();
        }
    }
}
