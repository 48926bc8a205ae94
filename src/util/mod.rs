//! Shared utilities: clocks and tracing setup.

pub mod clock;
pub mod telemetry;

pub use clock::*;
pub use telemetry::*;
