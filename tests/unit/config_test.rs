//! Tests for configuration validation

use std::collections::HashMap;
use std::time::Duration;

use subscription_notify::config::{
    ChannelConfig, NotifierConfig, StoreBackendConfig, CONFIG_PATH_ENV,
};

fn config_with(channels: HashMap<String, ChannelConfig>) -> NotifierConfig {
    NotifierConfig {
        channels,
        store: StoreBackendConfig::InMemory,
        langcode: "en".to_string(),
        mail_module: "subscription_notify".to_string(),
    }
}

#[test]
fn test_channel_config_validation() {
    let valid = ChannelConfig::new("Automated Notification");
    assert!(valid.validate().is_ok());
    assert_eq!(valid.lease(), Duration::from_secs(30));
    assert_eq!(valid.time_limit(), None);
}

#[test]
fn test_channel_config_invalid_subject() {
    let invalid = ChannelConfig::new("  ");
    assert!(invalid.validate().is_err());
}

#[test]
fn test_channel_config_invalid_lease() {
    let mut invalid = ChannelConfig::new("Digest");
    invalid.lease_secs = 0;
    assert!(invalid.validate().is_err());
}

#[test]
fn test_channel_time_limit() {
    let mut channel = ChannelConfig::new("Digest");
    channel.time_limit_secs = 45;
    assert_eq!(channel.time_limit(), Some(Duration::from_secs(45)));
}

#[test]
fn test_notifier_config_validation() {
    let mut channels = HashMap::new();
    channels.insert("digest".to_string(), ChannelConfig::new("Automated Notification"));
    assert!(config_with(channels).validate().is_ok());
}

#[test]
fn test_notifier_config_empty_channels() {
    assert!(config_with(HashMap::new()).validate().is_err());
}

#[test]
fn test_notifier_config_bad_channel_name() {
    let mut channels = HashMap::new();
    channels.insert("weekly digest".to_string(), ChannelConfig::new("Digest"));
    let err = config_with(channels).validate().unwrap_err();
    assert!(err.contains("weekly digest"));
}

#[test]
fn test_notifier_config_from_json() {
    let json = r#"{
        "channels": {
            "digest": { "default_subject": "Automated Notification" },
            "alerts": {
                "default_subject": "Alert",
                "lease_secs": 120,
                "time_limit_secs": 10
            }
        },
        "store": { "file": { "path": "/var/spool/notify" } }
    }"#;

    let config = NotifierConfig::from_json_str(json).unwrap();
    assert_eq!(config.langcode, "en");
    assert_eq!(config.mail_module, "subscription_notify");
    assert_eq!(config.channels["digest"].lease_secs, 30);
    assert_eq!(config.channels["alerts"].lease_secs, 120);
    assert_eq!(
        config.store,
        StoreBackendConfig::File {
            path: "/var/spool/notify".into()
        }
    );
}

#[test]
fn test_notifier_config_from_json_defaults_to_memory_store() {
    let json = r#"{ "channels": { "digest": { "default_subject": "Hi" } }, "store": "in_memory" }"#;
    let config = NotifierConfig::from_json_str(json).unwrap();
    assert_eq!(config.store, StoreBackendConfig::InMemory);
}

#[test]
fn test_notifier_config_from_json_rejects_invalid() {
    let json = r#"{ "channels": { "digest": { "default_subject": "", "lease_secs": 5 } } }"#;
    assert!(NotifierConfig::from_json_str(json).is_err());
    assert!(NotifierConfig::from_json_str("not json").is_err());
}

#[test]
fn test_notifier_config_from_env() {
    let dir = std::env::temp_dir().join(format!("notify-config-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("notifier.json");
    std::fs::write(
        &path,
        r#"{ "channels": { "digest": { "default_subject": "Hi" } }, "langcode": "de" }"#,
    )
    .unwrap();

    std::env::set_var(CONFIG_PATH_ENV, &path);
    let config = NotifierConfig::from_env().unwrap();
    assert_eq!(config.langcode, "de");
    assert!(config.channels.contains_key("digest"));

    std::env::remove_var(CONFIG_PATH_ENV);
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_file_store_rejects_unsafe_channel_names() {
    for name in ["a/b", ".x"] {
        let mut channels = HashMap::new();
        channels.insert(name.to_string(), ChannelConfig::new("Hi"));
        let mut config = config_with(channels);
        assert!(config.validate().is_ok());

        config.store = StoreBackendConfig::File {
            path: "/var/spool/notify".into(),
        };
        let err = config.validate().unwrap_err();
        assert!(err.contains("file store"));
    }
}
