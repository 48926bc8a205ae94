//! Background task that drives `poll` on a fixed interval.
//!
//! The engine itself is pull-based. Embedders that want deadlines to fire
//! without polling by hand spawn a ticker, which reads a [`Clock`] every tick and
//! polls with a bounded budget.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::PollConfig;
use crate::core::{DeadlineEngine, DeadlineQueue, Dispatch, Handler, PoolError};
use crate::util::clock::Clock;

/// Totals accumulated by a ticker over its lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickerReport {
    /// Ticks executed.
    pub ticks: u64,
    /// Requests fired across all ticks.
    pub fired: u64,
}

/// Handle to a running ticker. Dropping it stops the ticker without waiting.
pub struct PollTicker {
    stop_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<TickerReport>,
}

impl PollTicker {
    /// Stop the ticker and wait for its final report.
    ///
    /// # Errors
    ///
    /// Returns `PoolError::Internal` if the ticker task panicked or was aborted.
    pub async fn stop(mut self) -> Result<TickerReport, PoolError> {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        self.task
            .await
            .map_err(|e| PoolError::Internal(format!("ticker task failed: {e}")))
    }

    /// Whether the ticker task has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Spawn a ticker on the current tokio runtime.
///
/// Each tick polls `engine` with `clock.now()`, `handler`, and
/// `config.max_fire_per_tick`. Missed ticks are delayed, not bunched.
///
/// # Panics
///
/// Panics if called outside a tokio runtime, like `tokio::spawn`.
pub fn spawn_ticker<Q, D, C>(
    engine: Arc<DeadlineEngine<Q, D>>,
    clock: C,
    handler: Handler,
    config: &PollConfig,
) -> PollTicker
where
    Q: DeadlineQueue + Send + 'static,
    D: Dispatch + 'static,
    C: Clock + 'static,
{
    let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
    let period = Duration::from_millis(config.tick_interval_ms.max(1));
    let max_fire = config.max_fire_per_tick;

    let task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut report = TickerReport::default();

        loop {
            tokio::select! {
                _ = &mut stop_rx => break,
                _ = interval.tick() => {
                    let fired = engine.poll_with(clock.now(), &handler, max_fire);
                    report.ticks += 1;
                    report.fired += fired as u64;
                }
            }
        }

        tracing::debug!(ticks = report.ticks, fired = report.fired, "poll ticker stopped");
        report
    });

    PollTicker {
        stop_tx: Some(stop_tx),
        task,
    }
}
