//! Builders to construct a deadline engine from configuration.

use anyhow::Context;

use crate::config::{DispatchBackendConfig, DispatchConfig, EngineConfig};
use crate::core::{AppResult, DeadlineEngine, Dispatch, EngineError, RequestIdGenerator, WorkerPool};
use crate::infra::InMemoryDeadlineQueue;

/// Engine shape produced by the builders: bounded in-memory queue and a
/// dispatcher chosen at runtime.
pub type ConfiguredEngine = DeadlineEngine<InMemoryDeadlineQueue, Box<dyn Dispatch>>;

/// Build the dispatcher selected by `cfg`.
///
/// # Errors
///
/// Returns `EngineError::Config` if the worker pool cannot start or the tokio
/// backend is selected without a runtime (or without the `tokio-runtime` feature).
pub fn build_dispatcher(cfg: &DispatchConfig) -> Result<Box<dyn Dispatch>, EngineError> {
    match cfg.backend {
        DispatchBackendConfig::WorkerPool => {
            let pool = WorkerPool::new(cfg.pool.clone())
                .map_err(|e| EngineError::Config(format!("worker pool: {e}")))?;
            Ok(Box::new(pool))
        }
        #[cfg(feature = "tokio-runtime")]
        DispatchBackendConfig::Tokio => {
            let dispatcher = crate::runtime::TokioDispatcher::current()
                .map_err(|e| EngineError::Config(format!("tokio dispatcher: {e}")))?;
            Ok(Box::new(dispatcher))
        }
        #[cfg(not(feature = "tokio-runtime"))]
        DispatchBackendConfig::Tokio => Err(EngineError::Config(
            "tokio dispatch requires the `tokio-runtime` feature".into(),
        )),
    }
}

/// Build an engine from validated configuration.
///
/// # Errors
///
/// Returns `EngineError::Config` if the configuration is invalid or the
/// dispatcher cannot be built.
pub fn build_engine(cfg: &EngineConfig) -> Result<ConfiguredEngine, EngineError> {
    cfg.validate()
        .map_err(|e| EngineError::Config(format!("config invalid: {e}")))?;

    let queue = InMemoryDeadlineQueue::new(cfg.max_queue_depth);
    let dispatcher = build_dispatcher(&cfg.dispatch)?;
    let ids = RequestIdGenerator::starting_at(cfg.initial_request_id);

    tracing::info!(
        max_queue_depth = cfg.max_queue_depth,
        initial_request_id = cfg.initial_request_id,
        backend = ?cfg.dispatch.backend,
        "deadline engine built"
    );
    Ok(DeadlineEngine::with_id_generator(queue, dispatcher, ids))
}

/// Load `DEADLINE_ENGINE_*` configuration (and `.env`) and build an engine.
///
/// # Errors
///
/// Returns an error with context if the environment is invalid or the engine
/// cannot be built.
pub fn build_engine_from_env() -> AppResult<ConfiguredEngine> {
    let cfg = EngineConfig::from_env()
        .map_err(anyhow::Error::msg)
        .context("loading deadline engine configuration from environment")?;
    let engine = build_engine(&cfg).context("building deadline engine")?;
    Ok(engine)
}
