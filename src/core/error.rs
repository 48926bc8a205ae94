//! Error types for engine operations.

use thiserror::Error;

use super::RequestId;

/// Errors produced by the deadline engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Queue insertion failed after the ownership table was updated; the table
    /// insertion has been rolled back.
    #[error("capacity or invariant failure: {0}")]
    StructuralFailure(String),
    /// The request is not live (never scheduled, already fired, or cancelled).
    #[error("no deadline found for request id {0}")]
    NotFound(RequestId),
    /// The due-time queue holds no entries.
    #[error("deadline queue is empty")]
    EmptyQueue,
    /// Engine construction from configuration failed.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
