//! Audit sink implementations.
//!
//! Named queues can record one event per item transition (claim, sent,
//! failed, released) for operators who need a trail beyond the logs.

use std::collections::VecDeque;

use crate::util::clock::now_ms;
use crate::util::serde::ItemId;

/// Audit event structure.
#[derive(Debug, Clone)]
pub struct AuditEvent {
    /// Event identifier.
    pub event_id: String,
    /// Related item identifier.
    pub item_id: ItemId,
    /// Queue name.
    pub queue: String,
    /// Action taken (claim, sent, failed, released).
    pub action: String,
    /// Timestamp milliseconds.
    pub created_at_ms: u128,
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
    pub fn new(max_events: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(max_events),
            max_events,
        }
    }

    /// Retrieve a snapshot of stored events.
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

/// Helper to build an audit event; the id combines item, action and time.
pub fn build_audit_event(
    item_id: ItemId,
    queue: impl Into<String>,
    action: impl Into<String>,
    detail: Option<String>,
) -> AuditEvent {
    let action = action.into();
    let created_at_ms = now_ms();
    AuditEvent {
        event_id: format!("{item_id}-{action}-{created_at_ms}"),
        item_id,
        queue: queue.into(),
        action,
        created_at_ms,
        detail,
    }
}
