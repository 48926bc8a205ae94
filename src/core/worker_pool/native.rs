//! Native implementation of `WorkerPool` using OS threads.
//!
//! # Design Principles
//!
//! - **No polling**: workers block on channel recv
//! - **Bounded concurrency**: a fixed thread count caps concurrent handlers
//! - **Non-blocking hand-off**: submitters never wait on a busy worker
//! - **Panic isolation**: a panicking handler is counted, the worker keeps running
//! - **Clean shutdown**: dropping the sender unblocks workers naturally

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::config::WorkerPoolConfig;
use crate::core::executor::{Dispatch, Handler};
use crate::core::RequestId;

use super::{FireTask, PoolCounters, PoolError, PoolStats};

/// Worker pool with dedicated OS threads for deadline handlers.
pub struct WorkerPool {
    /// Pool configuration.
    config: WorkerPoolConfig,

    /// Task sender (to workers). Option allows clean shutdown by dropping.
    task_tx: Mutex<Option<Sender<FireTask>>>,

    /// Pool statistics counters (lock-free atomics).
    counters: Arc<PoolCounters>,

    /// Shutdown flag (lock-free atomic).
    shutdown: AtomicBool,

    /// Worker thread handles.
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    /// Create a new worker pool, spawning `config.worker_count` threads.
    ///
    /// # Errors
    ///
    /// Returns `PoolError::InvalidConfig` if the configuration is invalid, or
    /// `PoolError::Internal` if a worker thread cannot be spawned.
    pub fn new(config: WorkerPoolConfig) -> Result<Self, PoolError> {
        config.validate().map_err(PoolError::InvalidConfig)?;

        let (task_tx, task_rx) = unbounded::<FireTask>();
        let counters = Arc::new(PoolCounters::default());
        let shutdown = AtomicBool::new(false);

        let mut workers = Vec::with_capacity(config.worker_count);
        for worker_id in 0..config.worker_count {
            match spawn_worker(
                worker_id,
                task_rx.clone(),
                Arc::clone(&counters),
                config.thread_stack_size,
            ) {
                Ok(worker) => workers.push(worker),
                Err(e) => {
                    // Dropping the sender unblocks the threads already started
                    drop(task_tx);
                    return Err(PoolError::Internal(format!(
                        "failed to spawn worker {worker_id}: {e}"
                    )));
                }
            }
        }

        info!(
            worker_count = config.worker_count,
            max_queue_depth = config.max_queue_depth,
            "WorkerPool initialized with dedicated OS threads"
        );

        Ok(Self {
            config,
            task_tx: Mutex::new(Some(task_tx)),
            counters,
            shutdown,
            workers: Mutex::new(workers),
        })
    }

    /// Submit a handler. Never blocks: the channel is unbounded and only the
    /// worker count limits how many handlers run at once.
    ///
    /// A backlog above `max_queue_depth` is logged but still accepted.
    ///
    /// # Errors
    ///
    /// Returns `PoolError::PoolShutdown` if the pool has been shut down.
    pub fn submit(&self, request_id: RequestId, handler: Handler) -> Result<(), PoolError> {
        let backlog = self.enqueue(request_id, handler)?;
        if backlog > self.config.max_queue_depth {
            warn!(
                request_id = request_id,
                backlog = backlog,
                max_queue_depth = self.config.max_queue_depth,
                "Worker pool backlog above configured depth"
            );
        }
        Ok(())
    }

    /// Submit a handler unless `max_queue_depth` handlers are already waiting.
    ///
    /// # Errors
    ///
    /// - `PoolError::QueueFull` if the backlog is at `max_queue_depth`
    /// - `PoolError::PoolShutdown` if the pool has been shut down
    pub fn try_submit(&self, request_id: RequestId, handler: Handler) -> Result<(), PoolError> {
        let queued = self.counters.queued_tasks.load(Ordering::Acquire);
        if queued >= self.config.max_queue_depth as u64 {
            warn!(request_id = request_id, queued = queued, "Worker pool queue is full");
            return Err(PoolError::QueueFull);
        }
        self.enqueue(request_id, handler).map(|_| ())
    }

    /// Push a task onto the channel and return the backlog including it.
    fn enqueue(&self, request_id: RequestId, handler: Handler) -> Result<usize, PoolError> {
        let task_tx = self.sender()?;
        let task = FireTask {
            request_id,
            handler,
            enqueued_at: Instant::now(),
        };

        // Count before sending so a fast worker never decrements below zero
        let backlog = self.counters.queued_tasks.fetch_add(1, Ordering::AcqRel) + 1;
        if task_tx.send(task).is_err() {
            self.counters.queued_tasks.fetch_sub(1, Ordering::AcqRel);
            return Err(PoolError::PoolShutdown);
        }
        self.counters.submitted_tasks.fetch_add(1, Ordering::Relaxed);
        debug!(request_id = request_id, "Handler submitted to worker pool");
        Ok(usize::try_from(backlog).unwrap_or(usize::MAX))
    }

    /// Clone the sender out of its lock so sends never hold it.
    fn sender(&self) -> Result<Sender<FireTask>, PoolError> {
        if self.shutdown.load(Ordering::Acquire) {
            return Err(PoolError::PoolShutdown);
        }
        self.task_tx
            .lock()
            .as_ref()
            .cloned()
            .ok_or(PoolError::PoolShutdown)
    }

    /// Get current pool statistics.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.counters.snapshot(self.config.worker_count)
    }

    /// Whether `shutdown` has been called or the pool was dropped.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    /// Shut down the pool gracefully.
    ///
    /// Drops the task sender so idle workers exit once the queue drains, then joins
    /// each worker with a 2 second timeout. Workers that do not exit in time are
    /// detached.
    pub fn shutdown(&self) {
        if self.shutdown.swap(true, Ordering::AcqRel) {
            return;
        }

        info!("Shutting down worker pool");

        {
            let mut task_tx = self.task_tx.lock();
            *task_tx = None;
        }

        let mut workers = self.workers.lock();
        let worker_count = workers.len();

        for (idx, worker) in workers.drain(..).enumerate() {
            let (tx, rx) = std::sync::mpsc::channel();
            let join_thread = thread::spawn(move || {
                let result = worker.join();
                let _ = tx.send(result.is_ok());
            });

            match rx.recv_timeout(Duration::from_secs(2)) {
                Ok(true) => {
                    debug!(worker_id = idx, "Worker joined successfully");
                }
                Ok(false) => {
                    warn!(worker_id = idx, "Worker panicked");
                }
                Err(_) => {
                    warn!(worker_id = idx, "Worker did not exit within timeout - detaching");
                    continue;
                }
            }

            let _ = join_thread.join();
        }

        info!(worker_count = worker_count, "Worker pool shut down complete");
    }
}

impl Dispatch for WorkerPool {
    fn dispatch(&self, request_id: RequestId, handler: Handler) -> Result<(), PoolError> {
        self.submit(request_id, handler)
    }

    fn is_accepting(&self) -> bool {
        !self.is_shutdown()
    }

    fn shutdown(&self) {
        Self::shutdown(self);
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Signal shutdown but don't join: a handler may still be running
        if !self.shutdown.swap(true, Ordering::AcqRel) {
            let mut task_tx = self.task_tx.lock();
            *task_tx = None;
            debug!("WorkerPool dropped without explicit shutdown - workers will be detached");
        }
    }
}

/// Spawn a worker thread.
fn spawn_worker(
    worker_id: usize,
    task_rx: Receiver<FireTask>,
    counters: Arc<PoolCounters>,
    stack_size: usize,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(format!("deadline-worker-{worker_id}"))
        .stack_size(stack_size)
        .spawn(move || {
            debug!(worker_id = worker_id, "Worker thread started");

            // When every sender is dropped, recv returns Err and the worker exits
            while let Ok(task) = task_rx.recv() {
                counters.queued_tasks.fetch_sub(1, Ordering::AcqRel);

                counters.active_tasks.fetch_add(1, Ordering::Relaxed);

                let FireTask {
                    request_id,
                    handler,
                    enqueued_at,
                } = task;

                debug!(
                    worker_id = worker_id,
                    request_id = request_id,
                    queued_for_us = u64::try_from(enqueued_at.elapsed().as_micros()).unwrap_or(u64::MAX),
                    "Worker invoking deadline handler"
                );

                let outcome = panic::catch_unwind(AssertUnwindSafe(|| handler(request_id)));

                counters.active_tasks.fetch_sub(1, Ordering::Relaxed);
                if outcome.is_ok() {
                    counters.completed_tasks.fetch_add(1, Ordering::Relaxed);
                } else {
                    counters.failed_tasks.fetch_add(1, Ordering::Relaxed);
                    warn!(
                        worker_id = worker_id,
                        request_id = request_id,
                        "Deadline handler panicked"
                    );
                }
            }

            debug!(worker_id = worker_id, "Worker thread exiting");
        })
}
