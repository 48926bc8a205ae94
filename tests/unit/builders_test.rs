//! Tests for builder modules

use deadline_engine::builders::{build_dispatcher, build_engine};
use deadline_engine::config::{DispatchBackendConfig, DispatchConfig, EngineConfig, WorkerPoolConfig};
use deadline_engine::core::EngineError;

fn small_config() -> EngineConfig {
    let mut cfg = EngineConfig::default();
    cfg.max_queue_depth = 2;
    cfg.initial_request_id = 10;
    cfg.dispatch.pool = WorkerPoolConfig::new().with_worker_count(1).with_max_queue_depth(8);
    cfg
}

#[test]
fn test_build_engine_applies_config() {
    let engine = build_engine(&small_config()).unwrap();

    assert_eq!(engine.schedule(5).unwrap(), 10);
    assert_eq!(engine.schedule(6).unwrap(), 11);
    // Queue bound comes from max_queue_depth
    assert!(matches!(
        engine.schedule(7),
        Err(EngineError::StructuralFailure(_))
    ));
    assert_eq!(engine.poll(10, |_| {}, 10), 2);
    engine.shutdown();
}

#[test]
fn test_build_engine_rejects_invalid_config() {
    let mut cfg = small_config();
    cfg.max_queue_depth = 0;
    assert!(matches!(build_engine(&cfg), Err(EngineError::Config(_))));
}

#[test]
fn test_build_worker_pool_dispatcher() {
    let cfg = DispatchConfig {
        backend: DispatchBackendConfig::WorkerPool,
        pool: WorkerPoolConfig::new().with_worker_count(1),
    };
    let dispatcher = build_dispatcher(&cfg).unwrap();
    dispatcher.shutdown();
}

#[test]
fn test_tokio_dispatcher_needs_runtime() {
    let cfg = DispatchConfig {
        backend: DispatchBackendConfig::Tokio,
        pool: WorkerPoolConfig::default(),
    };
    assert!(matches!(build_dispatcher(&cfg), Err(EngineError::Config(_))));
}
