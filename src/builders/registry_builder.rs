//! Builders to construct a queue registry from configuration.

use std::sync::Arc;

use crate::config::{NotifierConfig, StoreBackendConfig};
use crate::core::{
    EventBus, FixedLocale, MailTransport, NotifyError, QueueRegistry, QueueServices, QueueStore,
};
use crate::infra::store::{FileStore, InMemoryStore};

/// Instantiate the store backend selected by the configuration.
///
/// # Errors
///
/// Fails when the file backend cannot open its directory.
pub fn build_store(cfg: &NotifierConfig) -> Result<Arc<dyn QueueStore>, NotifyError> {
    let store: Arc<dyn QueueStore> = match &cfg.store {
        StoreBackendConfig::InMemory => Arc::new(InMemoryStore::new()),
        StoreBackendConfig::File { path } => Arc::new(FileStore::open(path)?),
    };
    Ok(store)
}

/// Build a registry with one queue per configured channel.
///
/// The configured language is used for every message; the store comes from
/// [`build_store`]. Handlers and the transport are supplied by the caller
/// because they are application code.
///
/// # Errors
///
/// Fails when the configuration is invalid or the store cannot be opened.
pub fn build_registry(
    cfg: &NotifierConfig,
    bus: Arc<EventBus>,
    transport: Arc<dyn MailTransport>,
) -> Result<QueueRegistry, NotifyError> {
    cfg.validate()
        .map_err(|e| NotifyError::Config(format!("config invalid: {e}")))?;

    let store = build_store(cfg)?;
    let locale = Arc::new(FixedLocale::new(cfg.langcode.clone()));
    let mut registry = QueueRegistry::new(QueueServices::new(store, bus, transport, locale));

    let mut names: Vec<&String> = cfg.channels.keys().collect();
    names.sort();
    for name in names {
        let channel = &cfg.channels[name];
        let queue = registry
            .queue_factory(name, &channel.default_subject)
            .with_lease(channel.lease())
            .with_mail_module(cfg.mail_module.clone());
        registry.add_queue(queue);
    }

    tracing::info!(queues = registry.len(), "notification queues registered");
    Ok(registry)
}
