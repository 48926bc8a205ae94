//! Deadline entries and request identifier allocation.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Identifier handed back by `schedule`, unique for the lifetime of an engine.
pub type RequestId = u64;

/// Timestamp in the caller's unit and epoch (typically milliseconds since epoch).
pub type Timestamp = i64;

/// An immutable scheduled deadline.
///
/// Entries are value objects: the engine never mutates one after creation, it only
/// inserts and removes copies in its ownership table and due-time queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Deadline {
    /// Identifier assigned at schedule time.
    pub request_id: RequestId,
    /// Point in time at or after which the request becomes eligible to fire.
    pub due_time: Timestamp,
}

impl Deadline {
    /// Create a new deadline entry.
    #[must_use]
    pub const fn new(request_id: RequestId, due_time: Timestamp) -> Self {
        Self {
            request_id,
            due_time,
        }
    }

    /// Whether this deadline has arrived at `now`.
    #[must_use]
    pub const fn is_due(&self, now: Timestamp) -> bool {
        self.due_time <= now
    }
}

impl fmt::Display for Deadline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[request_id={}|due_time={}]", self.request_id, self.due_time)
    }
}

/// Strictly increasing request identifier source.
///
/// Identifiers are never reused, including ids consumed by a `schedule` call that
/// was later rolled back.
#[derive(Debug)]
pub struct RequestIdGenerator {
    next: AtomicU64,
}

impl RequestIdGenerator {
    /// Generator whose first identifier is `first`.
    #[must_use]
    pub const fn starting_at(first: RequestId) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }

    /// Allocate the next identifier.
    pub fn next_id(&self) -> RequestId {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    /// Allocate an identifier and build the deadline entry carrying it.
    pub fn create_deadline(&self, due_time: Timestamp) -> Deadline {
        Deadline::new(self.next_id(), due_time)
    }

    /// The identifier the next allocation will return.
    #[must_use]
    pub fn peek_next(&self) -> RequestId {
        self.next.load(Ordering::Relaxed)
    }
}

impl Default for RequestIdGenerator {
    fn default() -> Self {
        Self::starting_at(0)
    }
}
