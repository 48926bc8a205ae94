//! Tests for configuration validation

use deadline_engine::config::{
    DispatchBackendConfig, EngineConfig, PollConfig, WorkerPoolConfig,
};

#[test]
fn test_worker_pool_config_validation() {
    assert!(WorkerPoolConfig::new().validate().is_ok());
    assert!(WorkerPoolConfig::new().with_worker_count(0).validate().is_err());
    assert!(WorkerPoolConfig::new().with_max_queue_depth(0).validate().is_err());
    assert!(WorkerPoolConfig::new()
        .with_thread_stack_size(1024)
        .validate()
        .is_err());
}

#[test]
fn test_poll_config_validation() {
    assert!(PollConfig::default().validate().is_ok());

    let invalid = PollConfig {
        max_fire_per_tick: 0,
        ..PollConfig::default()
    };
    assert!(invalid.validate().is_err());

    let invalid = PollConfig {
        tick_interval_ms: 0,
        ..PollConfig::default()
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_engine_config_from_json() {
    let cfg = EngineConfig::from_json_str(
        r#"{
            "max_queue_depth": 500,
            "dispatch": { "backend": "tokio" },
            "poll": { "max_fire_per_tick": 32 }
        }"#,
    )
    .unwrap();

    assert_eq!(cfg.max_queue_depth, 500);
    assert_eq!(cfg.initial_request_id, 0);
    assert_eq!(cfg.dispatch.backend, DispatchBackendConfig::Tokio);
    assert_eq!(cfg.poll.max_fire_per_tick, 32);
    assert_eq!(cfg.poll.tick_interval_ms, PollConfig::default().tick_interval_ms);
}

#[test]
fn test_engine_config_from_json_rejects_invalid() {
    assert!(EngineConfig::from_json_str(r#"{ "max_queue_depth": 0 }"#).is_err());
    assert!(EngineConfig::from_json_str("not json").is_err());
}

#[test]
fn test_tokio_backend_skips_pool_validation() {
    let mut cfg = EngineConfig::default();
    cfg.dispatch.backend = DispatchBackendConfig::Tokio;
    cfg.dispatch.pool.worker_count = 0;
    assert!(cfg.validate().is_ok());

    cfg.dispatch.backend = DispatchBackendConfig::WorkerPool;
    assert!(cfg.validate().is_err());
}

#[test]
fn test_dispatch_backend_from_str() {
    assert_eq!(
        "Worker_Pool".parse::<DispatchBackendConfig>().unwrap(),
        DispatchBackendConfig::WorkerPool
    );
    assert_eq!(
        " tokio ".parse::<DispatchBackendConfig>().unwrap(),
        DispatchBackendConfig::Tokio
    );
    assert!("threads".parse::<DispatchBackendConfig>().is_err());
}
