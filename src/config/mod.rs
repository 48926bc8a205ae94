//! Configuration models for the engine, its dispatcher, and background polling.

pub mod engine;
pub mod worker_pool;

pub use engine::{DispatchBackendConfig, DispatchConfig, EngineConfig, PollConfig, ENV_PREFIX};
pub use worker_pool::WorkerPoolConfig;
