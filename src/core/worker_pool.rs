//! Bounded worker pool that runs fired-deadline handlers on dedicated threads.
//!
//! Fired requests are handed to a fixed set of OS threads through a channel, so
//! a deadline storm can never spawn unbounded concurrent handlers. Submission
//! never waits for a worker: a poll that fires thousands of requests returns as
//! soon as they are queued, however slow the handlers are.
//!
//! # Example
//!
//! ```rust,ignore
//! use deadline_engine::config::WorkerPoolConfig;
//! use deadline_engine::core::WorkerPool;
//!
//! let pool = WorkerPool::new(
//!     WorkerPoolConfig::new()
//!         .with_worker_count(4)
//!         .with_max_queue_depth(1024),
//! )?;
//! ```

mod native;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use super::executor::Handler;
use super::RequestId;

/// Errors that can occur when handing work to a dispatcher.
#[derive(Debug)]
pub enum PoolError {
    /// The backlog reached `max_queue_depth` (`try_submit` only).
    QueueFull,

    /// The pool has been shut down.
    PoolShutdown,

    /// Configuration validation failed.
    InvalidConfig(String),

    /// Internal error (thread spawn failure, missing runtime, etc.).
    Internal(String),
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QueueFull => write!(f, "task queue is full"),
            Self::PoolShutdown => write!(f, "pool has been shut down"),
            Self::InvalidConfig(msg) => write!(f, "invalid configuration: {msg}"),
            Self::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}

impl std::error::Error for PoolError {}

/// Statistics about pool utilization.
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    /// Number of worker threads.
    pub worker_count: usize,

    /// Handlers currently executing.
    pub active_tasks: u64,

    /// Handlers waiting in the queue.
    pub queued_tasks: u64,

    /// Handlers that returned normally.
    pub completed_tasks: u64,

    /// Handlers that panicked.
    pub failed_tasks: u64,

    /// Total handlers submitted.
    pub submitted_tasks: u64,
}

/// Internal counters for pool statistics (thread-safe).
#[derive(Debug, Default)]
pub(crate) struct PoolCounters {
    pub active_tasks: AtomicU64,
    pub queued_tasks: AtomicU64,
    pub completed_tasks: AtomicU64,
    pub failed_tasks: AtomicU64,
    pub submitted_tasks: AtomicU64,
}

impl PoolCounters {
    /// Get a snapshot of current statistics.
    pub fn snapshot(&self, worker_count: usize) -> PoolStats {
        PoolStats {
            worker_count,
            active_tasks: self.active_tasks.load(Ordering::Relaxed),
            queued_tasks: self.queued_tasks.load(Ordering::Relaxed),
            completed_tasks: self.completed_tasks.load(Ordering::Relaxed),
            failed_tasks: self.failed_tasks.load(Ordering::Relaxed),
            submitted_tasks: self.submitted_tasks.load(Ordering::Relaxed),
        }
    }
}

/// A fired request waiting for a worker.
pub(crate) struct FireTask {
    /// Request that fired.
    pub request_id: RequestId,
    /// Handler to invoke with the request id.
    pub handler: Handler,
    /// When the task was queued, for latency logging.
    pub enqueued_at: Instant,
}

pub use native::WorkerPool;
