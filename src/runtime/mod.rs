//! Tokio integration: a blocking-pool dispatcher and a background poll ticker.

pub mod ticker;
pub mod tokio_dispatcher;

pub use ticker::{spawn_ticker, PollTicker, TickerReport};
pub use tokio_dispatcher::TokioDispatcher;
