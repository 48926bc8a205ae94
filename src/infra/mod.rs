//! Infrastructure adapters for due-time queue storage.

pub mod queue;
pub use queue::InMemoryDeadlineQueue;
