//! Tests for the producer/operator API surface

use std::sync::Arc;

use serde_json::{json, Map, Value};
use subscription_notify::core::{
    EventBus, FixedLocale, NotifyError, QueueRegistry, QueueServices, SubscriptionRecord,
};
use subscription_notify::infra::{InMemoryStore, RecordingTransport};
use subscription_notify::config::{ChannelConfig, NotifierConfig};
use subscription_notify::runtime::{
    drain_all, enqueue_notification, enqueue_subscriptions, health, list_queues,
    NotificationRequest,
};

fn registry() -> QueueRegistry {
    let mut registry = QueueRegistry::new(QueueServices::new(
        Arc::new(InMemoryStore::new()),
        Arc::new(EventBus::empty()),
        Arc::new(RecordingTransport::new()),
        Arc::new(FixedLocale::default()),
    ));
    registry.register("digest", "Automated Notification");
    registry
}

fn recipient(email: &str) -> Map<String, Value> {
    json!({
        "email": email,
        "subscribe_to_type": "node",
        "subscribe_to_id": 5,
    })
    .as_object()
    .cloned()
    .unwrap()
}

#[test]
fn test_enqueue_notification_fills_sub_type() {
    let registry = registry();
    let mut fields = Map::new();
    fields.insert("event".to_string(), json!("node_update"));

    enqueue_notification(
        &registry,
        NotificationRequest {
            queue: "digest".to_string(),
            recipients: vec![recipient("a@example.com"), recipient("b@example.com")],
            fields,
        },
    )
    .unwrap();

    let queue = registry.get("digest").unwrap();
    let item = queue
        .claim_item(std::time::Duration::from_secs(30))
        .unwrap()
        .unwrap();
    assert_eq!(item.recipients().len(), 2);
    assert_eq!(item.recipients()[0].sub_type(), "digest");
    assert_eq!(item.data().field("event"), Some(&json!("node_update")));
}

#[test]
fn test_enqueue_notification_unknown_queue() {
    let err = enqueue_notification(
        &registry(),
        NotificationRequest {
            queue: "digets".to_string(),
            recipients: vec![],
            fields: Map::new(),
        },
    )
    .unwrap_err();
    assert!(matches!(err, NotifyError::QueueNotRegistered(_)));
}

#[test]
fn test_enqueue_notification_invalid_recipient_stores_nothing() {
    let registry = registry();
    let mut bad = recipient("a@example.com");
    bad.remove("email");

    let err = enqueue_notification(
        &registry,
        NotificationRequest {
            queue: "digest".to_string(),
            recipients: vec![recipient("ok@example.com"), bad],
            fields: Map::new(),
        },
    )
    .unwrap_err();
    assert!(matches!(err, NotifyError::EntityValidation(_)));
    assert_eq!(registry.get("digest").unwrap().number_of_items().unwrap(), 0);
}

#[test]
fn test_enqueue_subscriptions_skips_inactive() {
    let registry = registry();
    let queue = registry.get("digest").unwrap();
    let active = SubscriptionRecord {
        id: 1,
        sub_type: "digest".to_string(),
        email: "a@example.com".to_string(),
        subscribe_to_type: "node".to_string(),
        subscribe_to_id: 5,
        confirmed: true,
        ..Default::default()
    };
    let canceled = SubscriptionRecord {
        id: 2,
        canceled: true,
        ..active.clone()
    };

    let id = enqueue_subscriptions(&queue, &[active, canceled.clone()], Map::new()).unwrap();
    assert!(id.is_some());
    let none = enqueue_subscriptions(&queue, &[canceled], Map::new()).unwrap();
    assert!(none.is_none());
    assert_eq!(queue.number_of_items().unwrap(), 1);
}

#[test]
fn test_list_queues_and_health() {
    let registry = registry();
    enqueue_notification(
        &registry,
        NotificationRequest {
            queue: "digest".to_string(),
            recipients: vec![recipient("a@example.com")],
            fields: Map::new(),
        },
    )
    .unwrap();

    let snapshots = list_queues(&registry).unwrap();
    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[0].name, "digest");
    assert_eq!(snapshots[0].items, 1);
    assert!(health().ok);
}

#[test]
fn test_drain_all_merges_every_queue() {
    let mut registry = registry();
    registry.register("alerts", "Alert");
    for queue in ["digest", "alerts", "digest"] {
        enqueue_notification(
            &registry,
            NotificationRequest {
                queue: queue.to_string(),
                recipients: vec![recipient("a@example.com")],
                fields: Map::new(),
            },
        )
        .unwrap();
    }

    let mut cfg: NotifierConfig =
        serde_json::from_value(json!({ "channels": {} })).unwrap();
    cfg.channels
        .insert("digest".to_string(), ChannelConfig::new("Automated Notification"));

    let result = drain_all(&registry, &cfg).unwrap();
    assert_eq!(result.success(), 3);
    assert_eq!(result.total(), 3);
    assert!(list_queues(&registry).unwrap().iter().all(|q| q.items == 0));
}
