//! Audit sink implementations.
//!
//! The engine records one event per state transition when a sink is attached.
//! Events are recorded while the engine's state lock is held, so a sink sees
//! them in the order the transitions happened.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::{RequestId, Timestamp};
use crate::util::clock::now_ms;

/// Engine transition being recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// A request entered the table and the queue.
    Scheduled,
    /// A schedule was rolled back after queue insertion failed.
    RolledBack,
    /// A live request was cancelled.
    Cancelled,
    /// A live, due request left the table to be handed to the dispatcher.
    Fired,
    /// The dispatcher refused a fired request; its handler never runs.
    DispatchFailed,
    /// A tombstone was dequeued and dropped.
    Discarded,
    /// Tombstones were swept from the queue by an explicit compaction.
    Compacted,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Scheduled => "scheduled",
            Self::RolledBack => "rolled_back",
            Self::Cancelled => "cancelled",
            Self::Fired => "fired",
            Self::DispatchFailed => "dispatch_failed",
            Self::Discarded => "discarded",
            Self::Compacted => "compacted",
        };
        f.write_str(name)
    }
}

/// Audit event structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Event identifier.
    pub event_id: String,
    /// Related request, absent for batch events such as compaction.
    pub request_id: Option<RequestId>,
    /// Due time of the related request, when known.
    pub due_time: Option<Timestamp>,
    /// Action taken.
    pub action: AuditAction,
    /// Wall-clock time the event was recorded, in milliseconds since epoch.
    pub recorded_at_ms: Timestamp,
    /// Additional context.
    pub detail: Option<String>,
}

/// Audit sink abstraction.
pub trait AuditSink: Send {
    /// Record an audit event.
    fn record(&mut self, event: AuditEvent);
}

/// In-memory audit sink for testing and dev.
pub struct InMemoryAuditSink {
    events: VecDeque<AuditEvent>,
    max_events: usize,
}

impl InMemoryAuditSink {
    /// Create a new in-memory sink with a bounded buffer.
    #[must_use]
    pub fn new(max_events: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(max_events.min(4096)),
            max_events,
        }
    }

    /// Retrieve a snapshot of stored events.
    #[must_use]
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.iter().cloned().collect()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&mut self, event: AuditEvent) {
        if self.max_events == 0 {
            return;
        }
        if self.events.len() >= self.max_events {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }
}

/// Shared sinks let callers inspect events while the engine keeps recording.
impl<S: AuditSink> AuditSink for Arc<Mutex<S>> {
    fn record(&mut self, event: AuditEvent) {
        self.lock().record(event);
    }
}

/// Build an audit event stamped with a fresh id and the current wall-clock time.
#[must_use]
pub fn build_audit_event(
    action: AuditAction,
    request_id: Option<RequestId>,
    due_time: Option<Timestamp>,
    detail: Option<String>,
) -> AuditEvent {
    AuditEvent {
        event_id: Uuid::new_v4().to_string(),
        request_id,
        due_time,
        action,
        recorded_at_ms: now_ms(),
        detail,
    }
}
