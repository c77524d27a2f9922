//! Tests for utility functions

use subscription_notify::util::{init_tracing, now_ms, now_secs, EntityRef, ItemId};

#[test]
fn test_entity_ref_display() {
    let reference = EntityRef::new("node", 5);
    assert_eq!(reference.to_string(), "node#5");
}

#[test]
fn test_entity_ref_equality() {
    assert_eq!(EntityRef::new("node", 5), EntityRef::new("node".to_string(), 5));
    assert_ne!(EntityRef::new("node", 5), EntityRef::new("user", 5));
}

#[test]
fn test_clock() {
    assert!(now_secs() > 1_600_000_000);
    assert!(now_ms() > 1_600_000_000_000);
}

#[test]
fn test_item_id() {
    let id: ItemId = 12345;
    assert_eq!(id, 12345);
}

#[test]
fn test_init_tracing_is_idempotent() {
    init_tracing();
    init_tracing();
    tracing::info!("tracing initialized twice without panicking");
}
