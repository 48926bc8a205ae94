//! Tests for audit sink

use deadline_engine::core::{build_audit_event, AuditAction, AuditSink, InMemoryAuditSink};

#[test]
fn test_in_memory_audit_sink() {
    let mut sink = InMemoryAuditSink::new(10);

    let event = build_audit_event(AuditAction::Scheduled, Some(7), Some(1_000), None);
    sink.record(event.clone());
    assert_eq!(sink.events().len(), 1);

    let events = sink.events();
    assert_eq!(events[0].event_id, event.event_id);
    assert_eq!(events[0].request_id, Some(7));
    assert_eq!(events[0].due_time, Some(1_000));
    assert_eq!(events[0].action, AuditAction::Scheduled);
}

#[test]
fn test_audit_sink_overflow() {
    let mut sink = InMemoryAuditSink::new(2);

    for id in 0..3 {
        sink.record(build_audit_event(AuditAction::Fired, Some(id), Some(0), None));
    }

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].request_id, Some(1));
    assert_eq!(events[1].request_id, Some(2));
}

#[test]
fn test_audit_event_ids_are_unique() {
    let a = build_audit_event(AuditAction::Cancelled, Some(1), Some(5), None);
    let b = build_audit_event(AuditAction::Cancelled, Some(1), Some(5), None);
    assert_ne!(a.event_id, b.event_id);
    assert!(uuid::Uuid::parse_str(&a.event_id).is_ok());
}

#[test]
fn test_audit_event_serializes_action_snake_case() {
    let event = build_audit_event(
        AuditAction::RolledBack,
        Some(3),
        Some(10),
        Some("deadline queue at capacity (1)".to_string()),
    );
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["action"], "rolled_back");
    assert_eq!(json["request_id"], 3);
    assert_eq!(json["detail"], "deadline queue at capacity (1)");
}
