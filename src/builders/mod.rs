//! Builders to construct engines and dispatchers from configuration.

pub mod engine_builder;

pub use engine_builder::{build_dispatcher, build_engine, build_engine_from_env, ConfiguredEngine};
