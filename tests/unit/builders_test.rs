//! Tests for registry builders

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use subscription_notify::builders::{build_registry, build_store};
use subscription_notify::config::{ChannelConfig, NotifierConfig, StoreBackendConfig};
use subscription_notify::core::{EventBus, ItemData, NotifyError};
use subscription_notify::infra::RecordingTransport;

fn config() -> NotifierConfig {
    let mut channels = HashMap::new();
    channels.insert("digest".to_string(), ChannelConfig::new("Automated Notification"));
    let mut alerts = ChannelConfig::new("Alert");
    alerts.lease_secs = 90;
    channels.insert("alerts".to_string(), alerts);
    NotifierConfig {
        channels,
        store: StoreBackendConfig::InMemory,
        langcode: "de".to_string(),
        mail_module: "newsletter".to_string(),
    }
}

#[test]
fn test_build_registry_registers_every_channel() {
    let registry = build_registry(
        &config(),
        Arc::new(EventBus::empty()),
        Arc::new(RecordingTransport::new()),
    )
    .unwrap();

    assert_eq!(registry.queues(), vec!["alerts".to_string(), "digest".to_string()]);
    let alerts = registry.get("alerts").unwrap();
    assert_eq!(alerts.default_subject(), "Alert");
    assert_eq!(alerts.lease(), Duration::from_secs(90));
    assert_eq!(alerts.mail_module(), "newsletter");
}

#[test]
fn test_build_registry_uses_configured_language() {
    let transport = Arc::new(RecordingTransport::new());
    let registry =
        build_registry(&config(), Arc::new(EventBus::empty()), transport.clone()).unwrap();

    let digest = registry.get("digest").unwrap();
    digest.create_item(ItemData::default()).unwrap();
    digest.process(None);

    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].langcode, "de");
    assert_eq!(sent[0].module, "newsletter");
    assert_eq!(sent[0].key, "digest");
}

#[test]
fn test_build_registry_rejects_invalid_config() {
    let mut cfg = config();
    cfg.channels.clear();
    let err = build_registry(
        &cfg,
        Arc::new(EventBus::empty()),
        Arc::new(RecordingTransport::new()),
    )
    .unwrap_err();
    assert!(matches!(err, NotifyError::Config(_)));
}

#[test]
fn test_build_file_store() {
    let dir = std::env::temp_dir().join(format!("notify-builder-{}", uuid::Uuid::new_v4()));
    let mut cfg = config();
    cfg.store = StoreBackendConfig::File { path: dir.clone() };

    let store = build_store(&cfg).unwrap();
    store.create_item("digest", &ItemData::default()).unwrap();
    assert_eq!(store.number_of_items("digest").unwrap(), 1);
    assert!(dir.join("digest.jsonl").exists());
    std::fs::remove_dir_all(dir).unwrap();
}
