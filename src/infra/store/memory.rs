//! In-memory queue store with lease-based claims.

use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::core::{ItemData, NotifyError, QueueStore, RawItem};
use crate::util::clock::now_secs;
use crate::util::serde::ItemId;

struct StoredItem {
    raw: RawItem,
    lease_expires: Option<Instant>,
}

impl StoredItem {
    fn claimable(&self, now: Instant) -> bool {
        self.lease_expires.is_none_or(|expires| expires <= now)
    }
}

#[derive(Default)]
struct StoreState {
    next_id: ItemId,
    /// Items per queue, ordered by id so claims are FIFO.
    queues: HashMap<String, BTreeMap<ItemId, StoredItem>>,
}

/// Process-local store for development, tests and single-worker deployments.
///
/// A single mutex makes claims atomic. Items do not survive a restart; use
/// [`FileStore`](crate::infra::store::FileStore) for that.
pub struct InMemoryStore {
    max_depth: Option<usize>,
    state: Mutex<StoreState>,
}

impl InMemoryStore {
    /// Create an unbounded store.
    pub fn new() -> Self {
        Self {
            max_depth: None,
            state: Mutex::new(StoreState {
                next_id: 1,
                queues: HashMap::new(),
            }),
        }
    }

    /// Create a store that rejects new items once a queue holds `max_depth`.
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            max_depth: Some(max_depth),
            ..Self::new()
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl QueueStore for InMemoryStore {
    fn create_item(&self, queue: &str, data: &ItemData) -> Result<ItemId, NotifyError> {
        let mut state = self.state.lock();
        let depth = state.queues.get(queue).map_or(0, BTreeMap::len);
        if self.max_depth.is_some_and(|max| depth >= max) {
            return Err(NotifyError::Store(format!(
                "queue `{queue}` full: max depth reached"
            )));
        }
        let item_id = state.next_id;
        state.next_id += 1;
        let raw = RawItem {
            item_id,
            queue: queue.to_owned(),
            created: now_secs(),
            data: data.clone(),
        };
        state.queues.entry(queue.to_owned()).or_default().insert(
            item_id,
            StoredItem {
                raw,
                lease_expires: None,
            },
        );
        Ok(item_id)
    }

    fn claim_item(&self, queue: &str, lease: Duration) -> Result<Option<RawItem>, NotifyError> {
        let now = Instant::now();
        let mut state = self.state.lock();
        let Some(items) = state.queues.get_mut(queue) else {
            return Ok(None);
        };
        Ok(items
            .values_mut()
            .find(|item| item.claimable(now))
            .map(|item| {
                item.lease_expires = Some(now + lease);
                item.raw.clone()
            }))
    }

    fn delete_item(&self, item: &RawItem) -> Result<(), NotifyError> {
        let mut state = self.state.lock();
        if let Some(items) = state.queues.get_mut(&item.queue) {
            items.remove(&item.item_id);
        }
        Ok(())
    }

    fn release_item(&self, item: &RawItem) -> Result<bool, NotifyError> {
        let mut state = self.state.lock();
        let stored = state
            .queues
            .get_mut(&item.queue)
            .and_then(|items| items.get_mut(&item.item_id));
        Ok(stored.is_some_and(|stored| {
            stored.lease_expires = None;
            true
        }))
    }

    fn number_of_items(&self, queue: &str) -> Result<usize, NotifyError> {
        Ok(self.state.lock().queues.get(queue).map_or(0, BTreeMap::len))
    }

    fn delete_queue(&self, queue: &str) -> Result<(), NotifyError> {
        self.state.lock().queues.remove(queue);
        Ok(())
    }
}
