//! The deadline engine and its due-time queue abstraction.
//!
//! The engine pairs an ownership table (`request_id -> due_time`, the sole
//! record of liveness) with a min-ordered due-time queue. Cancellation touches
//! only the table; the orphaned queue entry becomes a tombstone that `poll`
//! discards when it reaches the front. Both structures sit behind one
//! `parking_lot::Mutex` so the pairing is never observed half-updated.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use super::audit::{build_audit_event, AuditAction, AuditSink};
use super::deadline::{Deadline, RequestId, RequestIdGenerator, Timestamp};
use super::error::EngineError;
use super::executor::{Dispatch, Handler};

/// Abstraction for due-time queue backends.
///
/// The queue never needs arbitrary removal: the engine only ever looks at and
/// removes the earliest entry, plus the explicit tombstone sweep in `retain`.
pub trait DeadlineQueue {
    /// Insert an entry.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::StructuralFailure` if the entry cannot be stored.
    fn push(&mut self, deadline: Deadline) -> Result<(), EngineError>;
    /// The entry with the earliest due time, if any.
    fn peek(&self) -> Option<&Deadline>;
    /// Remove and return the entry with the earliest due time.
    fn pop(&mut self) -> Option<Deadline>;
    /// Keep only entries for which `keep` returns true; returns how many were removed.
    fn retain(&mut self, keep: &mut dyn FnMut(&Deadline) -> bool) -> usize;
    /// Maximum depth allowed for this queue.
    fn max_depth(&self) -> usize;
    /// Current depth, tombstones included.
    fn len(&self) -> usize;
    /// Whether the queue holds no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Point-in-time view of engine activity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStats {
    /// Live requests (ownership table size).
    pub live: usize,
    /// Due-time queue entries, tombstones included.
    pub queued: usize,
    /// Successful `schedule` calls.
    pub scheduled_total: u64,
    /// Successful `cancel` calls.
    pub cancelled_total: u64,
    /// Requests fired by `poll` and accepted by the dispatcher.
    pub fired_total: u64,
    /// Tombstones dequeued by `poll` or removed by `compact`.
    pub tombstones_discarded: u64,
    /// `schedule` calls rolled back after a queue failure.
    pub rollbacks: u64,
    /// Due requests removed from the table that the dispatcher refused.
    pub dispatch_failures: u64,
}

#[derive(Debug, Default)]
struct EngineCounters {
    scheduled: AtomicU64,
    cancelled: AtomicU64,
    fired: AtomicU64,
    discarded: AtomicU64,
    rollbacks: AtomicU64,
    dispatch_failures: AtomicU64,
}

/// Table and queue, always locked together.
struct EngineState<Q> {
    live: HashMap<RequestId, Timestamp>,
    queue: Q,
}

/// Entries consumed by one drain pass.
#[derive(Debug, Default)]
struct Drained {
    fired: Vec<Deadline>,
    discarded: Vec<Deadline>,
}

impl<Q: DeadlineQueue> EngineState<Q> {
    /// Pop due entries until `budget` live requests have been taken, the queue
    /// empties, or its head is in the future. `observe` sees every popped entry
    /// in pop order, while the caller still holds the lock.
    fn drain_due<F>(&mut self, now: Timestamp, budget: usize, mut observe: F) -> Drained
    where
        F: FnMut(AuditAction, &Deadline),
    {
        let mut drained = Drained::default();

        // `fired.len() < budget` is re-checked every pass and fired grows by at
        // most one per pass, so dispatches can never exceed the budget.
        while drained.fired.len() < budget {
            match self.queue.peek() {
                Some(head) if head.is_due(now) => {}
                _ => break,
            }
            let Some(deadline) = self.queue.pop() else {
                break;
            };

            if self.live.remove(&deadline.request_id).is_some() {
                observe(AuditAction::Fired, &deadline);
                drained.fired.push(deadline);
            } else {
                observe(AuditAction::Discarded, &deadline);
                drained.discarded.push(deadline);
            }
        }

        drained
    }
}

/// Pull-based deadline scheduler.
///
/// `schedule`, `cancel`, `poll`, and the introspection accessors are safe to call
/// concurrently from any number of threads; share the engine through an `Arc`.
///
/// # Example
///
/// ```rust,ignore
/// use deadline_engine::config::WorkerPoolConfig;
/// use deadline_engine::core::{DeadlineEngine, WorkerPool};
/// use deadline_engine::infra::InMemoryDeadlineQueue;
///
/// let engine = DeadlineEngine::new(
///     InMemoryDeadlineQueue::unbounded(),
///     WorkerPool::new(WorkerPoolConfig::new().with_worker_count(2))?,
/// );
///
/// let id = engine.schedule(1_000)?;
/// assert_eq!(engine.size(), 1);
///
/// let fired = engine.poll(1_000, |id| println!("deadline {id} reached"), 16);
/// assert_eq!(fired, 1);
/// ```
pub struct DeadlineEngine<Q, D> {
    state: Mutex<EngineState<Q>>,
    ids: RequestIdGenerator,
    dispatcher: D,
    counters: EngineCounters,
    audit: Option<Mutex<Box<dyn AuditSink>>>,
}

impl<Q, D> DeadlineEngine<Q, D>
where
    Q: DeadlineQueue,
    D: Dispatch,
{
    /// Create an engine whose first request id is 0.
    pub fn new(queue: Q, dispatcher: D) -> Self {
        Self::with_id_generator(queue, dispatcher, RequestIdGenerator::default())
    }

    /// Create an engine drawing request ids from `ids`.
    pub fn with_id_generator(queue: Q, dispatcher: D, ids: RequestIdGenerator) -> Self {
        Self {
            state: Mutex::new(EngineState {
                live: HashMap::new(),
                queue,
            }),
            ids,
            dispatcher,
            counters: EngineCounters::default(),
            audit: None,
        }
    }

    /// Attach an audit sink.
    #[must_use]
    pub fn with_audit(mut self, audit: Box<dyn AuditSink>) -> Self {
        self.audit = Some(Mutex::new(audit));
        self
    }

    /// Schedule a request due at `due_time` and return its identifier.
    ///
    /// Due times in the past are accepted and fire on the next poll.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::StructuralFailure` if the queue rejects the entry. The
    /// table insertion is rolled back first, and the allocated id is not reused.
    pub fn schedule(&self, due_time: Timestamp) -> Result<RequestId, EngineError> {
        let mut state = self.state.lock();
        let deadline = self.ids.create_deadline(due_time);
        let request_id = deadline.request_id;

        state.live.insert(request_id, due_time);
        if let Err(e) = state.queue.push(deadline) {
            state.live.remove(&request_id);
            self.record_audit(AuditAction::RolledBack, Some(deadline), Some(e.to_string()));
            drop(state);

            self.counters.rollbacks.fetch_add(1, Ordering::Relaxed);
            warn!(
                request_id = request_id,
                due_time = due_time,
                error = %e,
                "schedule rolled back: queue insertion failed"
            );
            return Err(e);
        }
        self.record_audit(AuditAction::Scheduled, Some(deadline), None);
        drop(state);

        self.counters.scheduled.fetch_add(1, Ordering::Relaxed);
        debug!(request_id = request_id, due_time = due_time, "deadline scheduled");
        Ok(request_id)
    }

    /// Cancel a live request. Returns whether it was live.
    ///
    /// Only the ownership table is touched; the queue entry is left behind as a
    /// tombstone. Cancelling an unknown, fired, or already-cancelled id is a no-op.
    pub fn cancel(&self, request_id: RequestId) -> bool {
        let removed = {
            let mut state = self.state.lock();
            let removed = state.live.remove(&request_id);
            if let Some(due_time) = removed {
                self.record_audit(
                    AuditAction::Cancelled,
                    Some(Deadline::new(request_id, due_time)),
                    None,
                );
            }
            removed
        };

        let Some(due_time) = removed else {
            debug!(request_id = request_id, "cancel ignored: request not live");
            return false;
        };

        self.counters.cancelled.fetch_add(1, Ordering::Relaxed);
        debug!(request_id = request_id, due_time = due_time, "deadline cancelled");
        true
    }

    /// Fire up to `max_fire` live requests due at or before `now`.
    ///
    /// Returns the number of requests handed to the dispatcher. Tombstones met
    /// along the way are discarded without consuming the budget. `max_fire <= 0`
    /// returns 0 without touching the queue, and so does a dispatcher that no
    /// longer accepts work. Handlers run on the dispatcher; this call never waits
    /// for them and never waits for a future deadline.
    pub fn poll<H>(&self, now: Timestamp, handler: H, max_fire: i64) -> usize
    where
        H: Fn(RequestId) + Send + Sync + 'static,
    {
        let handler: Handler = Arc::new(handler);
        self.poll_with(now, &handler, max_fire)
    }

    /// `poll` with an already shared handler, for callers polling repeatedly.
    pub fn poll_with(&self, now: Timestamp, handler: &Handler, max_fire: i64) -> usize {
        let budget = match usize::try_from(max_fire) {
            Ok(budget) if budget > 0 => budget,
            _ => return 0,
        };
        if !self.dispatcher.is_accepting() {
            debug!(now = now, "poll skipped: dispatcher no longer accepts work");
            return 0;
        }

        let drained = self.state.lock().drain_due(now, budget, |action, deadline| {
            self.record_audit(action, Some(*deadline), None);
        });

        // Hand off outside the lock; dispatchers never block, but handlers may
        // start running before this loop finishes.
        let mut handed_off = 0;
        for deadline in &drained.fired {
            match self
                .dispatcher
                .dispatch(deadline.request_id, Arc::clone(handler))
            {
                Ok(()) => handed_off += 1,
                Err(e) => {
                    self.counters.dispatch_failures.fetch_add(1, Ordering::Relaxed);
                    error!(
                        request_id = deadline.request_id,
                        error = %e,
                        "dispatcher rejected fired deadline"
                    );
                    self.record_audit(
                        AuditAction::DispatchFailed,
                        Some(*deadline),
                        Some(e.to_string()),
                    );
                }
            }
        }

        let discarded = drained.discarded.len();
        self.counters.fired.fetch_add(handed_off as u64, Ordering::Relaxed);
        self.counters
            .discarded
            .fetch_add(discarded as u64, Ordering::Relaxed);

        if handed_off > 0 || discarded > 0 || !drained.fired.is_empty() {
            debug!(
                now = now,
                fired = handed_off,
                rejected = drained.fired.len() - handed_off,
                discarded = discarded,
                "poll drained due deadlines"
            );
        }
        handed_off
    }

    /// Number of live requests.
    pub fn size(&self) -> usize {
        self.state.lock().live.len()
    }

    /// Number of queue entries, tombstones included. Always `>= size()`.
    pub fn queue_size(&self) -> usize {
        self.state.lock().queue.len()
    }

    /// Due time at the front of the queue. The entry may be a tombstone.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::EmptyQueue` if the queue is empty.
    pub fn next_deadline(&self) -> Result<Timestamp, EngineError> {
        self.state
            .lock()
            .queue
            .peek()
            .map(|d| d.due_time)
            .ok_or(EngineError::EmptyQueue)
    }

    /// Due time of a live request.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NotFound` if the request was never scheduled, has
    /// fired, or was cancelled.
    pub fn enquire(&self, request_id: RequestId) -> Result<Timestamp, EngineError> {
        self.state
            .lock()
            .live
            .get(&request_id)
            .copied()
            .ok_or(EngineError::NotFound(request_id))
    }

    /// Sweep every tombstone out of the queue and return how many were removed.
    ///
    /// Never called implicitly; `cancel` stays O(1).
    pub fn compact(&self) -> usize {
        let removed = {
            let mut guard = self.state.lock();
            let EngineState { live, queue } = &mut *guard;
            let removed = queue.retain(&mut |d| live.contains_key(&d.request_id));
            if removed > 0 {
                self.record_audit(
                    AuditAction::Compacted,
                    None,
                    Some(format!("removed {removed} tombstones")),
                );
            }
            removed
        };

        if removed > 0 {
            self.counters
                .discarded
                .fetch_add(removed as u64, Ordering::Relaxed);
            debug!(removed = removed, "compacted deadline queue");
        }
        removed
    }

    /// Snapshot of engine counters.
    pub fn stats(&self) -> EngineStats {
        let (live, queued) = {
            let state = self.state.lock();
            (state.live.len(), state.queue.len())
        };
        EngineStats {
            live,
            queued,
            scheduled_total: self.counters.scheduled.load(Ordering::Relaxed),
            cancelled_total: self.counters.cancelled.load(Ordering::Relaxed),
            fired_total: self.counters.fired.load(Ordering::Relaxed),
            tombstones_discarded: self.counters.discarded.load(Ordering::Relaxed),
            rollbacks: self.counters.rollbacks.load(Ordering::Relaxed),
            dispatch_failures: self.counters.dispatch_failures.load(Ordering::Relaxed),
        }
    }

    /// The dispatcher handed fired requests.
    pub const fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    /// Stop the dispatcher. Later polls return 0 and leave every request live.
    pub fn shutdown(&self) {
        self.dispatcher.shutdown();
    }

    /// Send one transition to the attached sink. Callers hold the state lock so
    /// the sink order matches the transition order.
    fn record_audit(&self, action: AuditAction, deadline: Option<Deadline>, detail: Option<String>) {
        if let Some(audit_sink) = &self.audit {
            let mut sink = audit_sink.lock();
            sink.record(build_audit_event(
                action,
                deadline.map(|d| d.request_id),
                deadline.map(|d| d.due_time),
                detail,
            ));
        }
    }
}
