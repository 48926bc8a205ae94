//! In-memory due-time queue backed by a binary heap.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::core::{Deadline, DeadlineQueue, EngineError};

/// Wrapper making `Deadline` min-ordered by due time inside a max-heap.
///
/// Ties are broken by request id so equal due times dequeue in schedule order;
/// callers must not rely on that.
#[derive(Debug)]
struct QueuedDeadline(Deadline);

impl PartialEq for QueuedDeadline {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for QueuedDeadline {}

impl PartialOrd for QueuedDeadline {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedDeadline {
    fn cmp(&self, other: &Self) -> Ordering {
        // Earliest due time first (reversed for max-heap)
        other
            .0
            .due_time
            .cmp(&self.0.due_time)
            .then_with(|| other.0.request_id.cmp(&self.0.request_id))
    }
}

/// Bounded in-memory due-time queue.
///
/// O(log n) push and pop, O(1) peek. Pushing past `max_depth` fails, which the
/// engine surfaces as a structural failure after rolling back its table.
pub struct InMemoryDeadlineQueue {
    max_depth: usize,
    entries: BinaryHeap<QueuedDeadline>,
}

impl InMemoryDeadlineQueue {
    /// Create a new queue holding at most `max_depth` entries, tombstones included.
    #[must_use]
    pub fn new(max_depth: usize) -> Self {
        Self {
            max_depth,
            entries: BinaryHeap::with_capacity(max_depth.min(1024)),
        }
    }

    /// Queue without a practical depth limit.
    #[must_use]
    pub fn unbounded() -> Self {
        Self::new(usize::MAX)
    }
}

impl Default for InMemoryDeadlineQueue {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl DeadlineQueue for InMemoryDeadlineQueue {
    fn push(&mut self, deadline: Deadline) -> Result<(), EngineError> {
        if self.entries.len() >= self.max_depth {
            return Err(EngineError::StructuralFailure(format!(
                "deadline queue at capacity ({})",
                self.max_depth
            )));
        }
        self.entries.push(QueuedDeadline(deadline));
        Ok(())
    }

    fn peek(&self) -> Option<&Deadline> {
        self.entries.peek().map(|q| &q.0)
    }

    fn pop(&mut self) -> Option<Deadline> {
        self.entries.pop().map(|q| q.0)
    }

    fn retain(&mut self, keep: &mut dyn FnMut(&Deadline) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|q| keep(&q.0));
        before - self.entries.len()
    }

    fn max_depth(&self) -> usize {
        self.max_depth
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
