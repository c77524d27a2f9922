//! Tests for audit sink

use subscription_notify::core::{build_audit_event, AuditSink, InMemoryAuditSink};

#[test]
fn test_in_memory_audit_sink() {
    let mut sink = InMemoryAuditSink::new(10);

    let event = build_audit_event(1, "digest", "claim", Some("detail".to_string()));

    sink.record(event.clone());
    assert_eq!(sink.events().len(), 1);

    let events = sink.events();
    assert_eq!(events[0].event_id, event.event_id);
    assert_eq!(events[0].item_id, 1);
    assert_eq!(events[0].action, "claim");
}

#[test]
fn test_audit_sink_overflow() {
    let mut sink = InMemoryAuditSink::new(2);

    sink.record(build_audit_event(1, "digest", "claim", None));
    sink.record(build_audit_event(2, "digest", "claim", None));
    sink.record(build_audit_event(3, "digest", "claim", None));

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].item_id, 2); // First one popped
    assert_eq!(events[1].item_id, 3);
}

#[test]
fn test_build_audit_event() {
    let event = build_audit_event(9, "alerts", "sent", Some("ok".to_string()));

    assert!(event.event_id.starts_with("9-sent-"));
    assert_eq!(event.queue, "alerts");
    assert_eq!(event.action, "sent");
    assert_eq!(event.detail, Some("ok".to_string()));
    assert!(event.created_at_ms > 0);
}
