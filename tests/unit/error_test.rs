//! Tests for error types

use deadline_engine::core::{EngineError, PoolError};

#[test]
fn test_structural_failure_error() {
    let err = EngineError::StructuralFailure("deadline queue at capacity (4)".to_string());
    assert_eq!(
        format!("{err}"),
        "capacity or invariant failure: deadline queue at capacity (4)"
    );
}

#[test]
fn test_not_found_error() {
    let err = EngineError::NotFound(17);
    assert_eq!(format!("{err}"), "no deadline found for request id 17");
}

#[test]
fn test_empty_queue_error() {
    assert_eq!(format!("{}", EngineError::EmptyQueue), "deadline queue is empty");
}

#[test]
fn test_config_error() {
    let err = EngineError::Config("max_queue_depth must be greater than 0".to_string());
    assert_eq!(
        format!("{err}"),
        "invalid configuration: max_queue_depth must be greater than 0"
    );
}

#[test]
fn test_pool_errors() {
    assert_eq!(format!("{}", PoolError::QueueFull), "task queue is full");
    assert_eq!(format!("{}", PoolError::PoolShutdown), "pool has been shut down");
    assert_eq!(
        format!("{}", PoolError::Internal("boom".to_string())),
        "internal error: boom"
    );
}

#[test]
fn test_engine_error_converts_to_anyhow() {
    fn fails() -> deadline_engine::core::AppResult<()> {
        Err(EngineError::EmptyQueue)?;
        Ok(())
    }
    let err = fails().unwrap_err();
    assert!(err.downcast_ref::<EngineError>().is_some());
}
