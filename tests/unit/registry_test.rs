//! Tests for the queue registry

use std::sync::Arc;

use subscription_notify::core::{
    EventBus, FixedLocale, NotifyError, QueueRegistry, QueueServices,
};
use subscription_notify::infra::{InMemoryStore, RecordingTransport};

fn registry() -> QueueRegistry {
    QueueRegistry::new(QueueServices::new(
        Arc::new(InMemoryStore::new()),
        Arc::new(EventBus::empty()),
        Arc::new(RecordingTransport::new()),
        Arc::new(FixedLocale::default()),
    ))
}

#[test]
fn test_unregistered_queue_fails() {
    let registry = registry();
    let err = registry.get("unregistered").unwrap_err();
    assert!(matches!(err, NotifyError::QueueNotRegistered(name) if name == "unregistered"));
    assert!(registry.is_empty());
}

#[test]
fn test_added_queue_is_returned_as_same_instance() {
    let mut registry = registry();
    let queue = registry.queue_factory("x", "Automated Notification");
    assert!(!registry.contains("x"));

    let added = registry.add_queue(queue);
    let fetched = registry.get("x").unwrap();
    assert!(Arc::ptr_eq(&added, &fetched));
    assert!(registry.queues().contains(&"x".to_string()));
    assert_eq!(fetched.default_subject(), "Automated Notification");
}

#[test]
fn test_queue_names_are_sorted() {
    let mut registry = registry();
    registry.register("zeta", "Z");
    registry.register("alpha", "A");
    assert_eq!(registry.queues(), vec!["alpha".to_string(), "zeta".to_string()]);
    assert_eq!(registry.len(), 2);
}

#[test]
fn test_re_adding_replaces() {
    let mut registry = registry();
    let first = registry.register("digest", "Old");
    let second = registry.register("digest", "New");
    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(registry.get("digest").unwrap().default_subject(), "New");
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_queues_share_the_store() {
    let mut registry = registry();
    let a = registry.register("a", "A");
    let b = registry.register("b", "B");
    a.create_item(subscription_notify::core::ItemData::default()).unwrap();
    assert_eq!(a.number_of_items().unwrap(), 1);
    assert_eq!(b.number_of_items().unwrap(), 0);
    assert_eq!(registry.services().store.number_of_items("a").unwrap(), 1);
}
