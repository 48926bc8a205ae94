//! Core engine, entry types, and dispatch.

pub mod audit;
pub mod deadline;
pub mod engine;
pub mod error;
pub mod executor;
pub mod worker_pool;

pub use audit::{build_audit_event, AuditAction, AuditEvent, AuditSink, InMemoryAuditSink};
pub use deadline::{Deadline, RequestId, RequestIdGenerator, Timestamp};
pub use engine::{DeadlineEngine, DeadlineQueue, EngineStats};
pub use error::{AppResult, EngineError};
pub use executor::{Dispatch, Handler};
pub use worker_pool::{PoolError, PoolStats, WorkerPool};
