//! Tests for the tokio dispatcher and poll ticker

use std::sync::Arc;
use std::time::Duration;

use deadline_engine::config::PollConfig;
use deadline_engine::core::{DeadlineEngine, Dispatch, Handler, PoolError, RequestId};
use deadline_engine::infra::InMemoryDeadlineQueue;
use deadline_engine::runtime::{spawn_ticker, TokioDispatcher};
use deadline_engine::util::ManualClock;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_tokio_dispatcher_runs_handler() {
    let dispatcher = TokioDispatcher::new(tokio::runtime::Handle::current());

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let handler: Handler = Arc::new(move |id: RequestId| {
        tx.send(id).unwrap();
    });
    dispatcher.dispatch(123, handler).unwrap();

    let result = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("handler timed out");
    assert_eq!(result, Some(123));
}

#[tokio::test]
async fn test_tokio_dispatcher_rejects_after_shutdown() {
    let dispatcher = TokioDispatcher::current().unwrap();
    dispatcher.shutdown();

    let noop: Handler = Arc::new(|_: RequestId| {});
    assert!(matches!(
        dispatcher.dispatch(1, noop),
        Err(PoolError::PoolShutdown)
    ));
}

#[test]
fn test_tokio_dispatcher_current_outside_runtime() {
    assert!(matches!(TokioDispatcher::current(), Err(PoolError::Internal(_))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_ticker_fires_as_clock_advances() {
    let engine = Arc::new(DeadlineEngine::new(
        InMemoryDeadlineQueue::unbounded(),
        TokioDispatcher::current().unwrap(),
    ));
    engine.schedule(100).unwrap();
    engine.schedule(200).unwrap();
    engine.schedule(300).unwrap();

    let clock = ManualClock::new(0);
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let handler: Handler = Arc::new(move |id: RequestId| {
        let _ = tx.send(id);
    });
    let config = PollConfig {
        max_fire_per_tick: 1,
        tick_interval_ms: 5,
    };
    let ticker = spawn_ticker(Arc::clone(&engine), clock.clone(), handler, &config);

    clock.set(250);
    let mut fired = Vec::new();
    for _ in 0..2 {
        let id = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("ticker did not fire")
            .unwrap();
        fired.push(id);
    }
    fired.sort_unstable();
    assert_eq!(fired, vec![0, 1]);

    let report = ticker.stop().await.unwrap();
    assert_eq!(report.fired, 2);
    assert!(report.ticks >= 2);
    assert_eq!(engine.size(), 1);
    assert_eq!(engine.enquire(2).unwrap(), 300);
}
