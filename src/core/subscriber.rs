//! Subscriber value object.
//!
//! A [`Subscriber`] is an immutable snapshot of one confirmed, non-canceled
//! subscription. It is built per notification, embedded in queue payloads as a
//! recipient, and discarded afterwards; nothing here persists it.

use std::fmt::Write as _;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::NotifyError;
use crate::util::clock::now_secs;
use crate::util::serde::EntityRef;

/// Pattern used when `"long"` is requested from [`Subscriber::format_created`].
pub const LONG_DATE_FORMAT: &str = "%A, %B %-d, %Y - %H:%M";

/// Returned by the date formatters when a timestamp or pattern cannot be rendered.
pub const INVALID_DATE: &str = "Invalid date";

/// Subscription record as persisted by the host system.
///
/// Optional fields may be missing on older rows; they default to empty/zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    /// Subscription identifier.
    pub id: u64,
    /// Subscription UUID.
    #[serde(default)]
    pub uuid: Option<String>,
    /// Channel (queue name) the subscription belongs to.
    pub sub_type: String,
    /// Owning user, absent for anonymous subscriptions.
    #[serde(default)]
    pub uid: Option<u64>,
    /// Delivery address.
    pub email: String,
    /// Target entity type.
    pub subscribe_to_type: String,
    /// Target entity id.
    pub subscribe_to_id: u64,
    /// Source entity type, if any.
    #[serde(default)]
    pub subscribe_from_type: Option<String>,
    /// Source entity id, if any.
    #[serde(default)]
    pub subscribe_from_id: Option<u64>,
    /// Creation timestamp (unix seconds).
    #[serde(default)]
    pub created: Option<i64>,
    /// Last delivery timestamp (unix seconds).
    #[serde(default)]
    pub last_sent: Option<i64>,
    /// Whether the subscriber confirmed the subscription.
    #[serde(default)]
    pub confirmed: bool,
    /// Whether the subscription was canceled.
    #[serde(default)]
    pub canceled: bool,
}

/// Entity resolved from a subscriber's target or source reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetEntity {
    /// Reference that was resolved.
    pub reference: EntityRef,
    /// Human readable label.
    pub label: String,
    /// Canonical URL, when the entity has one.
    pub url: Option<String>,
}

/// Lookup of entities referenced by subscriptions.
pub trait EntityRepository: Send + Sync {
    /// Load an entity, returning `None` when it no longer exists.
    fn load(&self, reference: &EntityRef) -> Option<TargetEntity>;
}

/// One confirmed, active subscription relevant to a single notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscriber {
    sub_id: u64,
    uuid: String,
    sub_type: String,
    uid: u64,
    email: String,
    subscribe_to_type: String,
    subscribe_to_id: u64,
    #[serde(default)]
    subscribe_from_type: String,
    #[serde(default)]
    subscribe_from_id: u64,
    created: i64,
    #[serde(default)]
    last_sent: i64,
    #[serde(default = "now_secs")]
    confirmed: i64,
}

impl Subscriber {
    /// Build a subscriber from a persisted subscription record.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::EntityValidation`] if the record is canceled or
    /// was never confirmed.
    pub fn from_stored_subscription(record: &SubscriptionRecord) -> Result<Self, NotifyError> {
        if record.canceled {
            return Err(NotifyError::EntityValidation(format!(
                "subscription {} is canceled",
                record.id
            )));
        }
        if !record.confirmed {
            return Err(NotifyError::EntityValidation(format!(
                "subscription {} is not confirmed",
                record.id
            )));
        }

        Ok(Self {
            sub_id: record.id,
            uuid: record.uuid.clone().unwrap_or_default(),
            sub_type: record.sub_type.clone(),
            uid: record.uid.unwrap_or_default(),
            email: record.email.clone(),
            subscribe_to_type: record.subscribe_to_type.clone(),
            subscribe_to_id: record.subscribe_to_id,
            subscribe_from_type: record.subscribe_from_type.clone().unwrap_or_default(),
            subscribe_from_id: record.subscribe_from_id.unwrap_or_default(),
            created: record.created.unwrap_or_default(),
            last_sent: record.last_sent.unwrap_or_default(),
            confirmed: now_secs(),
        })
    }

    /// Build an ad hoc subscriber from loose values.
    ///
    /// `sub_type`, `email`, `subscribe_to_type` and `subscribe_to_id` are
    /// required. Everything else falls back to anonymous/zero defaults, with
    /// `created` set to now and a fresh UUID.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::EntityValidation`] when a required key is absent
    /// or holds a value of the wrong type.
    pub fn from_values(values: &Map<String, Value>) -> Result<Self, NotifyError> {
        let sub_type = required_str(values, "sub_type")?;
        let email = required_str(values, "email")?;
        let subscribe_to_type = required_str(values, "subscribe_to_type")?;
        let subscribe_to_id = required_u64(values, "subscribe_to_id")?;

        let now = now_secs();
        Ok(Self {
            sub_id: optional_u64(values, "sub_id").unwrap_or(0),
            uuid: values
                .get("uuid")
                .and_then(Value::as_str)
                .map_or_else(|| uuid::Uuid::new_v4().to_string(), str::to_owned),
            sub_type,
            uid: optional_u64(values, "uid").unwrap_or(0),
            email,
            subscribe_to_type,
            subscribe_to_id,
            subscribe_from_type: values
                .get("subscribe_from_type")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_owned(),
            subscribe_from_id: optional_u64(values, "subscribe_from_id").unwrap_or(0),
            created: values.get("created").and_then(Value::as_i64).unwrap_or(now),
            last_sent: values.get("last_sent").and_then(Value::as_i64).unwrap_or(0),
            confirmed: now,
        })
    }

    /// Subscription identifier (0 for ad hoc subscribers).
    pub const fn sub_id(&self) -> u64 {
        self.sub_id
    }

    /// Subscription UUID.
    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    /// Channel this subscription belongs to.
    pub fn sub_type(&self) -> &str {
        &self.sub_type
    }

    /// Owning user id, 0 when anonymous.
    pub const fn uid(&self) -> u64 {
        self.uid
    }

    /// Whether the subscription has no owning user.
    pub const fn is_anonymous(&self) -> bool {
        self.uid == 0
    }

    /// Delivery address.
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Target entity type.
    pub fn subscribe_to_type(&self) -> &str {
        &self.subscribe_to_type
    }

    /// Target entity id.
    pub const fn subscribe_to_id(&self) -> u64 {
        self.subscribe_to_id
    }

    /// Source entity type, empty when the subscription has no source.
    pub fn subscribe_from_type(&self) -> &str {
        &self.subscribe_from_type
    }

    /// Source entity id, 0 when the subscription has no source.
    pub const fn subscribe_from_id(&self) -> u64 {
        self.subscribe_from_id
    }

    /// Creation timestamp (unix seconds).
    pub const fn created(&self) -> i64 {
        self.created
    }

    /// Last delivery timestamp (unix seconds), 0 if never sent.
    pub const fn last_sent(&self) -> i64 {
        self.last_sent
    }

    /// Virtual confirmation timestamp, fixed when the snapshot was built.
    pub const fn confirmed(&self) -> i64 {
        self.confirmed
    }

    /// Virtual cancellation timestamp. Always 0: canceled subscriptions are
    /// rejected at construction.
    pub const fn canceled(&self) -> i64 {
        0
    }

    /// Reference to the subscribed-to entity.
    pub fn target_ref(&self) -> EntityRef {
        EntityRef::new(self.subscribe_to_type.clone(), self.subscribe_to_id)
    }

    /// Reference to the entity the subscription was made from, if any.
    pub fn source_ref(&self) -> Option<EntityRef> {
        if self.subscribe_from_type.is_empty() {
            return None;
        }
        Some(EntityRef::new(
            self.subscribe_from_type.clone(),
            self.subscribe_from_id,
        ))
    }

    /// Resolve the subscribed-to entity. `None` if it no longer exists.
    pub fn target_entity(&self, repository: &dyn EntityRepository) -> Option<TargetEntity> {
        repository.load(&self.target_ref())
    }

    /// Resolve the source entity. `None` when there is no source or it is gone.
    pub fn source_entity(&self, repository: &dyn EntityRepository) -> Option<TargetEntity> {
        self.source_ref()
            .and_then(|reference| repository.load(&reference))
    }

    /// Render the creation timestamp.
    ///
    /// `"long"` selects [`LONG_DATE_FORMAT`]; anything else is used as a
    /// strftime pattern. Unrenderable input yields [`INVALID_DATE`].
    pub fn format_created(&self, format: &str) -> String {
        format_timestamp(self.created, format)
    }

    /// Render the last delivery timestamp, with the same rules as
    /// [`Subscriber::format_created`].
    pub fn format_last_sent(&self, format: &str) -> String {
        format_timestamp(self.last_sent, format)
    }
}

fn format_timestamp(timestamp: i64, format: &str) -> String {
    let pattern = if format == "long" { LONG_DATE_FORMAT } else { format };
    let items: Vec<Item<'_>> = StrftimeItems::new(pattern).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return INVALID_DATE.to_owned();
    }
    let Some(datetime) = DateTime::<Utc>::from_timestamp(timestamp, 0) else {
        return INVALID_DATE.to_owned();
    };
    let mut rendered = String::new();
    if write!(rendered, "{}", datetime.format_with_items(items.iter())).is_err() {
        return INVALID_DATE.to_owned();
    }
    rendered
}

fn required_str(values: &Map<String, Value>, key: &str) -> Result<String, NotifyError> {
    values
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| NotifyError::EntityValidation(format!("missing required field `{key}`")))
}

fn required_u64(values: &Map<String, Value>, key: &str) -> Result<u64, NotifyError> {
    optional_u64(values, key)
        .ok_or_else(|| NotifyError::EntityValidation(format!("missing required field `{key}`")))
}

/// Accepts both JSON numbers and numeric strings, as producers send either.
fn optional_u64(values: &Map<String, Value>, key: &str) -> Option<u64> {
    match values.get(key)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
