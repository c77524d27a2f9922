//! API-facing request/response models.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::{ChannelConfig, NotifierConfig};
use crate::core::{
    ItemData, NamedQueue, NotifyError, ProcessResult, QueueRegistry, Subscriber,
    SubscriptionRecord,
};
use crate::util::serde::ItemId;

/// Notification submission payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRequest {
    /// Registered queue to push onto.
    pub queue: String,
    /// Loose subscriber values; `sub_type` defaults to the queue name.
    pub recipients: Vec<Map<String, Value>>,
    /// Producer fields stored beside the recipients.
    #[serde(default)]
    pub fields: Map<String, Value>,
}

/// Queue listing entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueSnapshot {
    /// Queue name.
    pub name: String,
    /// Default subject.
    pub default_subject: String,
    /// Items currently stored.
    pub items: usize,
}

/// Health response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Health {
    /// Healthy flag.
    pub ok: bool,
}

/// Validate recipients and push a notification onto a registered queue.
///
/// # Errors
///
/// Unknown queue, invalid recipient values, or a store failure.
pub fn enqueue_notification(
    registry: &QueueRegistry,
    req: NotificationRequest,
) -> Result<ItemId, NotifyError> {
    let queue = registry.get(&req.queue)?;
    let recipients = req
        .recipients
        .into_iter()
        .map(|mut values| {
            values
                .entry("sub_type")
                .or_insert_with(|| Value::String(req.queue.clone()));
            Subscriber::from_values(&values)
        })
        .collect::<Result<Vec<_>, _>>()?;
    queue.create_item(ItemData {
        recipients,
        fields: req.fields,
    })
}

/// Push a notification for stored subscriptions, dropping canceled or
/// unconfirmed ones. Returns `None` when no valid recipient remains.
///
/// # Errors
///
/// Propagates store failures.
pub fn enqueue_subscriptions(
    queue: &NamedQueue,
    records: &[SubscriptionRecord],
    fields: Map<String, Value>,
) -> Result<Option<ItemId>, NotifyError> {
    let recipients: Vec<Subscriber> = records
        .iter()
        .filter_map(|record| match Subscriber::from_stored_subscription(record) {
            Ok(subscriber) => Some(subscriber),
            Err(err) => {
                tracing::debug!(queue = queue.name(), "skipping subscription: {err}");
                None
            }
        })
        .collect();
    if recipients.is_empty() {
        return Ok(None);
    }
    queue
        .create_item(ItemData { recipients, fields })
        .map(Some)
}

/// Snapshot every registered queue.
///
/// # Errors
///
/// Propagates store failures.
pub fn list_queues(registry: &QueueRegistry) -> Result<Vec<QueueSnapshot>, NotifyError> {
    registry
        .queues()
        .into_iter()
        .map(|name| {
            let queue = registry.get(&name)?;
            Ok(QueueSnapshot {
                items: queue.number_of_items()?,
                default_subject: queue.default_subject().to_owned(),
                name,
            })
        })
        .collect()
}

/// Drain every registered queue once, in name order, and fold the results.
///
/// Each queue runs with its channel's `time_limit_secs`; queues without a
/// channel entry run without a budget.
///
/// # Errors
///
/// Fails only if a listed queue disappears from the registry.
pub fn drain_all(registry: &QueueRegistry, cfg: &NotifierConfig) -> Result<ProcessResult, NotifyError> {
    let mut total = ProcessResult::new();
    for name in registry.queues() {
        let queue = registry.get(&name)?;
        let budget = cfg.channels.get(&name).and_then(ChannelConfig::time_limit);
        total.merge(queue.process(budget));
    }
    Ok(total)
}

/// Return a health payload.
pub fn health() -> Health {
    Health { ok: true }
}
