//! Handler and dispatch abstractions.

use std::sync::Arc;

use super::worker_pool::PoolError;
use super::RequestId;

/// Callback invoked once per fired request.
///
/// Shared across every request fired by one `poll` call, so it must be callable
/// concurrently from several dispatch threads.
pub type Handler = Arc<dyn Fn(RequestId) + Send + Sync + 'static>;

/// Hands fired requests off to an independent execution context.
///
/// Implementations must neither run the handler on the calling thread nor block
/// waiting for capacity: the caller is the polling thread and must return while
/// handlers are still running.
///
/// # Example
///
/// ```rust,ignore
/// use deadline_engine::core::{Dispatch, Handler, PoolError, RequestId};
///
/// struct ThreadPerFire;
///
/// impl Dispatch for ThreadPerFire {
///     fn dispatch(&self, request_id: RequestId, handler: Handler) -> Result<(), PoolError> {
///         std::thread::spawn(move || handler(request_id));
///         Ok(())
///     }
/// }
/// ```
pub trait Dispatch: Send + Sync {
    /// Submit `handler(request_id)` for asynchronous execution.
    ///
    /// # Errors
    ///
    /// Returns a `PoolError` if the execution context no longer accepts work.
    fn dispatch(&self, request_id: RequestId, handler: Handler) -> Result<(), PoolError>;

    /// Whether `dispatch` can currently accept work. The engine checks this
    /// before draining so requests are never removed for a dead dispatcher.
    fn is_accepting(&self) -> bool {
        true
    }

    /// Stop accepting work. The default does nothing.
    fn shutdown(&self) {}
}

impl<D: Dispatch + ?Sized> Dispatch for Arc<D> {
    fn dispatch(&self, request_id: RequestId, handler: Handler) -> Result<(), PoolError> {
        (**self).dispatch(request_id, handler)
    }

    fn is_accepting(&self) -> bool {
        (**self).is_accepting()
    }

    fn shutdown(&self) {
        (**self).shutdown();
    }
}

impl<D: Dispatch + ?Sized> Dispatch for Box<D> {
    fn dispatch(&self, request_id: RequestId, handler: Handler) -> Result<(), PoolError> {
        (**self).dispatch(request_id, handler)
    }

    fn is_accepting(&self) -> bool {
        (**self).is_accepting()
    }

    fn shutdown(&self) {
        (**self).shutdown();
    }
}
