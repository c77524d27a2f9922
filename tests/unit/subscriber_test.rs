//! Tests for the subscriber value object

use serde_json::{json, Map, Value};
use subscription_notify::core::{NotifyError, Subscriber, SubscriptionRecord, TargetEntity};
use subscription_notify::infra::InMemoryEntities;
use subscription_notify::util::{now_secs, EntityRef};

fn record(confirmed: bool, canceled: bool) -> SubscriptionRecord {
    SubscriptionRecord {
        id: 11,
        uuid: Some("0d4c".to_string()),
        sub_type: "digest".to_string(),
        uid: None,
        email: "reader@example.com".to_string(),
        subscribe_to_type: "node".to_string(),
        subscribe_to_id: 5,
        subscribe_from_type: None,
        subscribe_from_id: None,
        created: Some(1_700_000_000),
        last_sent: None,
        confirmed,
        canceled,
    }
}

fn required_values() -> Map<String, Value> {
    json!({
        "sub_type": "digest",
        "email": "adhoc@example.com",
        "subscribe_to_type": "node",
        "subscribe_to_id": 5,
    })
    .as_object()
    .cloned()
    .unwrap()
}

fn entity(reference: EntityRef, label: &str) -> TargetEntity {
    TargetEntity {
        reference,
        label: label.to_string(),
        url: None,
    }
}

#[test]
fn test_confirmed_active_record_builds() {
    let sub = Subscriber::from_stored_subscription(&record(true, false)).unwrap();
    assert_eq!(sub.canceled(), 0);
    assert_eq!(sub.uid(), 0);
    assert_eq!(sub.email(), "reader@example.com");
    assert_eq!(sub.created(), 1_700_000_000);
    assert!((sub.confirmed() - now_secs()).abs() <= 2);
}

#[test]
fn test_canceled_or_unconfirmed_record_fails() {
    for (confirmed, canceled) in [(true, true), (false, false), (false, true)] {
        let result = Subscriber::from_stored_subscription(&record(confirmed, canceled));
        assert!(matches!(result, Err(NotifyError::EntityValidation(_))));
    }
}

#[test]
fn test_from_values_defaults() {
    let sub = Subscriber::from_values(&required_values()).unwrap();
    assert_eq!(sub.uid(), 0);
    assert_eq!(sub.last_sent(), 0);
    assert_eq!(sub.subscribe_from_type(), "");
    assert_eq!(sub.subscribe_from_id(), 0);
    assert!((sub.created() - now_secs()).abs() <= 2);
    assert_eq!(sub.canceled(), 0);
}

#[test]
fn test_from_values_missing_required_key_fails() {
    for key in ["sub_type", "email", "subscribe_to_type", "subscribe_to_id"] {
        let mut values = required_values();
        values.remove(key);
        let err = Subscriber::from_values(&values).unwrap_err();
        assert!(matches!(err, NotifyError::EntityValidation(_)));
        assert!(err.to_string().contains(key));
    }
}

#[test]
fn test_target_entity_resolution() {
    let mut entities = InMemoryEntities::new();
    entities.insert(entity(EntityRef::new("node", 5), "Release notes"));

    let sub = Subscriber::from_values(&required_values()).unwrap();
    let target = sub.target_entity(&entities).unwrap();
    assert_eq!(target.label, "Release notes");

    entities.remove(&EntityRef::new("node", 5));
    assert!(sub.target_entity(&entities).is_none());
}

#[test]
fn test_source_entity_resolution() {
    let mut entities = InMemoryEntities::new();
    entities.insert(entity(EntityRef::new("user", 2), "Editor"));

    let mut values = required_values();
    values.insert("subscribe_from_type".to_string(), json!("user"));
    values.insert("subscribe_from_id".to_string(), json!(2));
    let sub = Subscriber::from_values(&values).unwrap();
    assert_eq!(sub.source_entity(&entities).unwrap().label, "Editor");

    let plain = Subscriber::from_values(&required_values()).unwrap();
    assert!(plain.source_entity(&entities).is_none());
}

#[test]
fn test_format_created() {
    let sub = Subscriber::from_stored_subscription(&record(true, false)).unwrap();
    assert_eq!(sub.format_created("long"), "Tuesday, November 14, 2023 - 22:13");
    assert_eq!(sub.format_created("%d/%m/%Y"), "14/11/2023");
    assert_eq!(sub.format_last_sent("%Y"), "1970");
}
