//! # Deadline Engine
//!
//! A pull-based deadline scheduler: callers schedule requests to be notified at or
//! after a due time, and later poll with the current time to fire everything that
//! has come due, up to a per-call budget.
//!
//! It is the in-memory building block beneath timer wheels, expiry managers, and
//! SLA watchdogs inside larger services.
//!
//! ## Core Design
//!
//! - **Ownership table**: `request_id -> due_time`, the only record of which
//!   requests are still live. `size()` and cancellation read it alone.
//! - **Due-time queue**: a min-heap over every scheduled entry. It cannot remove
//!   arbitrary entries, so `cancel` leaves a tombstone behind.
//! - **Bounded drain**: `poll` pops due entries, fires the live ones and silently
//!   drops tombstones, and never fires more than `max_fire` per call.
//! - **Pooled dispatch**: fired ids go to a fixed-size worker pool (or tokio's
//!   blocking pool), never run on the polling thread.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use deadline_engine::config::WorkerPoolConfig;
//! use deadline_engine::core::{DeadlineEngine, WorkerPool};
//! use deadline_engine::infra::InMemoryDeadlineQueue;
//!
//! let engine = DeadlineEngine::new(
//!     InMemoryDeadlineQueue::unbounded(),
//!     WorkerPool::new(WorkerPoolConfig::new().with_worker_count(2))?,
//! );
//!
//! let a = engine.schedule(100)?;
//! let b = engine.schedule(200)?;
//! assert!(engine.cancel(b));
//!
//! // Fires `a`; `b` is a tombstone and is discarded without counting
//! let fired = engine.poll(250, |id| println!("deadline {id} reached"), 10);
//! assert_eq!(fired, 1);
//! assert_eq!(engine.size(), 0);
//! ```
//!
//! ## Configuration
//!
//! ```rust,ignore
//! use deadline_engine::builders::build_engine;
//! use deadline_engine::config::EngineConfig;
//!
//! let cfg = EngineConfig::from_json_str(r#"{ "max_queue_depth": 10000 }"#)?;
//! let engine = build_engine(&cfg)?;
//! ```
//!
//! For complete examples, see:
//! - `tests/deadline_engine_test.rs` - engine scenarios and concurrency
//! - `tests/worker_pool_test.rs` - dispatch behaviour

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core engine, entry types, errors, and dispatch.
pub mod core;
/// Configuration models for the engine, dispatcher, and ticker.
pub mod config;
/// Builders to construct engines from configuration.
pub mod builders;
/// Infrastructure adapters for due-time queue storage.
pub mod infra;
/// Tokio dispatcher and background poll ticker.
#[cfg(feature = "tokio-runtime")]
pub mod runtime;
/// Shared utilities.
pub mod util;
