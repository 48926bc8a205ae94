//! Tokio runtime dispatcher implementation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::core::{Dispatch, Handler, PoolError, RequestId};

/// Dispatcher that runs handlers on a tokio runtime's blocking thread pool.
///
/// The blocking pool is bounded by the runtime's `max_blocking_threads`, so a
/// burst of fired deadlines queues inside tokio rather than spawning threads.
#[derive(Clone)]
pub struct TokioDispatcher {
    handle: tokio::runtime::Handle,
    closed: Arc<AtomicBool>,
}

impl TokioDispatcher {
    /// Create a dispatcher from a tokio runtime handle.
    #[must_use]
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self {
            handle,
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Create a dispatcher bound to the runtime of the calling context.
    ///
    /// # Errors
    ///
    /// Returns `PoolError::Internal` when called outside a tokio runtime.
    pub fn current() -> Result<Self, PoolError> {
        tokio::runtime::Handle::try_current()
            .map(Self::new)
            .map_err(|e| PoolError::Internal(format!("no tokio runtime: {e}")))
    }
}

impl Dispatch for TokioDispatcher {
    fn dispatch(&self, request_id: RequestId, handler: Handler) -> Result<(), PoolError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(PoolError::PoolShutdown);
        }
        let task = self.handle.spawn_blocking(move || handler(request_id));
        // Surface handler panics in logs; nobody else awaits the task
        self.handle.spawn(async move {
            if let Err(e) = task.await {
                tracing::warn!(request_id = request_id, error = %e, "deadline handler failed");
            }
        });
        Ok(())
    }

    fn is_accepting(&self) -> bool {
        !self.closed.load(Ordering::Acquire)
    }

    fn shutdown(&self) {
        self.closed.store(true, Ordering::Release);
    }
}
