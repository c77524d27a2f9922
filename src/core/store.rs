//! Durable queue store contract and the raw payload it persists.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::{NotifyError, Subscriber};
use crate::util::serde::ItemId;

/// Producer payload stored for one notification job.
///
/// `recipients` is the only field this subsystem interprets; everything else
/// a producer adds is kept in `fields` and flattened beside it on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemData {
    /// Subscribers to notify, processed in list order.
    #[serde(default)]
    pub recipients: Vec<Subscriber>,
    /// Producer-defined fields.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl ItemData {
    /// Payload addressed to the given recipients.
    pub fn new(recipients: Vec<Subscriber>) -> Self {
        Self {
            recipients,
            fields: Map::new(),
        }
    }

    /// Attach a producer field.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    /// Read a producer field.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

/// Item as handed out by a store claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawItem {
    /// Store-assigned identifier.
    pub item_id: ItemId,
    /// Queue the item belongs to.
    pub queue: String,
    /// Creation timestamp (unix seconds).
    pub created: i64,
    /// Producer payload.
    pub data: ItemData,
}

/// Persistence capability the named queues are built on.
///
/// Implementations must guarantee that no two claimants receive the same item
/// while a lease is active, and that an expired lease makes the item
/// claimable again without outside help.
pub trait QueueStore: Send + Sync {
    /// Persist a new item on `queue` and return its id.
    fn create_item(&self, queue: &str, data: &ItemData) -> Result<ItemId, NotifyError>;

    /// Lease the oldest available item on `queue` for `lease`.
    fn claim_item(&self, queue: &str, lease: Duration) -> Result<Option<RawItem>, NotifyError>;

    /// Remove an item permanently.
    fn delete_item(&self, item: &RawItem) -> Result<(), NotifyError>;

    /// Drop the lease on an item so it can be claimed immediately.
    /// Returns `false` if the item no longer exists.
    fn release_item(&self, item: &RawItem) -> Result<bool, NotifyError>;

    /// Count every item on `queue`, leased or not.
    fn number_of_items(&self, queue: &str) -> Result<usize, NotifyError>;

    /// Remove every item on `queue`.
    fn delete_queue(&self, queue: &str) -> Result<(), NotifyError>;
}
