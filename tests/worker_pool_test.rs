//! Integration tests for fired-request dispatch through `WorkerPool`
//!
//! These tests validate:
//! - Concurrent submission from many threads
//! - Panic isolation between handlers
//! - Graceful shutdown, including through the engine

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, unbounded};

use deadline_engine::config::WorkerPoolConfig;
use deadline_engine::core::{
    DeadlineEngine, Dispatch, Handler, PoolError, RequestId, WorkerPool,
};
use deadline_engine::infra::InMemoryDeadlineQueue;

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn pool(workers: usize, depth: usize) -> WorkerPool {
    WorkerPool::new(
        WorkerPoolConfig::new()
            .with_worker_count(workers)
            .with_max_queue_depth(depth),
    )
    .expect("Failed to create pool")
}

fn wait_until(timeout: Duration, mut done: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if done() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    done()
}

// ============================================================================
// BASIC EXECUTION
// ============================================================================

#[test]
fn test_pool_creation() {
    let pool = pool(4, 100);
    let stats = pool.stats();
    assert_eq!(stats.worker_count, 4);
    assert_eq!(stats.submitted_tasks, 0);
    assert!(!pool.is_shutdown());
}

#[test]
fn test_invalid_config_rejected() {
    let result = WorkerPool::new(WorkerPoolConfig::new().with_worker_count(0));
    assert!(matches!(result, Err(PoolError::InvalidConfig(_))));

    let result = WorkerPool::new(WorkerPoolConfig::new().with_max_queue_depth(0));
    assert!(matches!(result, Err(PoolError::InvalidConfig(_))));
}

#[test]
fn test_concurrent_submission() {
    let pool = Arc::new(pool(4, 1024));
    let total = Arc::new(AtomicU64::new(0));
    let handler: Handler = {
        let total = Arc::clone(&total);
        Arc::new(move |id: RequestId| {
            total.fetch_add(id, Ordering::SeqCst);
        })
    };

    let mut handles = Vec::new();
    for t in 0..8_u64 {
        let pool = Arc::clone(&pool);
        let handler = Arc::clone(&handler);
        handles.push(thread::spawn(move || {
            for i in 1..=100 {
                pool.submit(t * 100 + i, Arc::clone(&handler)).unwrap();
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    // Sum of 1..=800
    assert!(wait_until(Duration::from_secs(5), || {
        total.load(Ordering::SeqCst) == 320_400
    }));
    assert!(wait_until(Duration::from_secs(5), || {
        pool.stats().completed_tasks == 800
    }));
    assert_eq!(pool.stats().submitted_tasks, 800);
}

// ============================================================================
// FAILURE ISOLATION
// ============================================================================

#[test]
fn test_panicking_handler_does_not_kill_worker() {
    let pool = pool(1, 16);
    let (tx, rx) = unbounded();

    let handler: Handler = Arc::new(move |id: RequestId| {
        assert!(id % 2 == 0, "odd request {id}");
        tx.send(id).unwrap();
    });
    for id in 0..6 {
        pool.submit(id, Arc::clone(&handler)).unwrap();
    }

    let mut seen = Vec::new();
    for _ in 0..3 {
        seen.push(rx.recv_timeout(Duration::from_secs(5)).unwrap());
    }
    seen.sort_unstable();
    assert_eq!(seen, vec![0, 2, 4]);

    assert!(wait_until(Duration::from_secs(5), || {
        let stats = pool.stats();
        stats.failed_tasks == 3 && stats.completed_tasks == 3
    }));
}

// ============================================================================
// SHUTDOWN
// ============================================================================

#[test]
fn test_shutdown_drains_queued_handlers() {
    let pool = pool(1, 64);
    let count = Arc::new(AtomicU64::new(0));
    let handler: Handler = {
        let count = Arc::clone(&count);
        Arc::new(move |_: RequestId| {
            thread::sleep(Duration::from_millis(1));
            count.fetch_add(1, Ordering::SeqCst);
        })
    };
    for id in 0..20 {
        pool.submit(id, Arc::clone(&handler)).unwrap();
    }

    pool.shutdown();
    assert_eq!(count.load(Ordering::SeqCst), 20);
}

#[test]
fn test_engine_shutdown_keeps_requests_live() {
    let engine = DeadlineEngine::new(InMemoryDeadlineQueue::unbounded(), pool(1, 16));
    engine.schedule(10).unwrap();
    engine.schedule(20).unwrap();

    engine.shutdown();
    assert!(engine.dispatcher().is_shutdown());

    // Nothing can run the handlers, so nothing leaves the engine
    assert_eq!(engine.poll(100, |_| {}, 10), 0);
    assert_eq!(engine.size(), 2);
    assert_eq!(engine.queue_size(), 2);
    assert_eq!(engine.enquire(0).unwrap(), 10);
    assert_eq!(engine.stats().fired_total, 0);
    assert_eq!(engine.stats().dispatch_failures, 0);
}

#[test]
fn test_pool_as_trait_object() {
    let dispatcher: Box<dyn Dispatch> = Box::new(pool(1, 4));
    let (tx, rx) = bounded(1);
    let handler: Handler = Arc::new(move |id: RequestId| tx.send(id).unwrap());

    dispatcher.dispatch(9, handler).unwrap();
    assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), 9);
    dispatcher.shutdown();
}
