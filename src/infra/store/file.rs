//! File-backed queue store inspired by Yaque.
//!
//! Each queue lives in `<dir>/<queue>.jsonl`, one item per line together with
//! its lease deadline. Leases are wall-clock based so a worker that crashes
//! mid-lease leaves items that become claimable again after a restart.
//! Claims are only atomic within one process.

use std::collections::HashMap;
use std::fs::{self, create_dir_all, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::core::{ItemData, NotifyError, QueueStore, RawItem};
use crate::util::clock::{now_ms, now_secs};
use crate::util::serde::ItemId;

/// Whether `queue` can name a queue file: ASCII alphanumerics, `_`, `-` and
/// `.`, not starting with a dot.
pub fn is_file_safe_queue_name(queue: &str) -> bool {
    !queue.is_empty()
        && !queue.starts_with('.')
        && queue
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FileRecord {
    item: RawItem,
    /// Lease deadline in ms since epoch; `None` when available.
    lease_expires_ms: Option<u128>,
}

impl FileRecord {
    fn claimable(&self, now: u128) -> bool {
        self.lease_expires_ms.is_none_or(|expires| expires <= now)
    }
}

#[derive(Default)]
struct FileState {
    next_id: ItemId,
    queues: HashMap<String, Vec<FileRecord>>,
}

/// File-backed store using JSON lines for durability.
pub struct FileStore {
    path: PathBuf,
    state: Mutex<FileState>,
}

impl FileStore {
    /// Open (or create) a store rooted at `path`, loading every queue file.
    ///
    /// # Errors
    ///
    /// Fails if the directory cannot be created or a queue file is corrupt.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, NotifyError> {
        let path = path.as_ref().to_path_buf();
        create_dir_all(&path).map_err(|e| NotifyError::Store(e.to_string()))?;
        let store = Self {
            path,
            state: Mutex::new(FileState {
                next_id: 1,
                queues: HashMap::new(),
            }),
        };
        store.load_from_disk()?;
        Ok(store)
    }

    /// Directory the queue files live in.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn file_path(&self, queue: &str) -> Result<PathBuf, NotifyError> {
        if !is_file_safe_queue_name(queue) {
            return Err(NotifyError::Store(format!(
                "queue name `{queue}` cannot be used as a file name"
            )));
        }
        Ok(self.path.join(format!("{queue}.jsonl")))
    }

    fn load_from_disk(&self) -> Result<(), NotifyError> {
        let entries = fs::read_dir(&self.path).map_err(|e| NotifyError::Store(e.to_string()))?;
        let mut state = self.state.lock();
        for entry in entries {
            let file_path = entry.map_err(|e| NotifyError::Store(e.to_string()))?.path();
            if file_path.extension().and_then(|ext| ext.to_str()) != Some("jsonl") {
                continue;
            }
            let Some(queue) = file_path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            let records = read_records(&file_path)?;
            if let Some(max) = records.iter().map(|r| r.item.item_id).max() {
                state.next_id = state.next_id.max(max + 1);
            }
            state.queues.insert(queue.to_owned(), records);
        }
        Ok(())
    }

    fn rewrite_disk(&self, queue: &str, records: &[FileRecord]) -> Result<(), NotifyError> {
        let file_path = self.file_path(queue)?;
        let tmp_path = file_path.with_extension("jsonl.tmp");
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp_path)
            .map_err(|e| NotifyError::Store(e.to_string()))?;
        for record in records {
            let line =
                serde_json::to_string(record).map_err(|e| NotifyError::Store(e.to_string()))?;
            writeln!(file, "{line}").map_err(|e| NotifyError::Store(e.to_string()))?;
        }
        file.sync_all()
            .map_err(|e| NotifyError::Store(e.to_string()))?;
        fs::rename(&tmp_path, &file_path).map_err(|e| NotifyError::Store(e.to_string()))
    }

    /// Persist `records` for `queue`, then publish them. Memory is left
    /// untouched when the write fails.
    fn commit(
        &self,
        state: &mut FileState,
        queue: &str,
        records: Vec<FileRecord>,
    ) -> Result<(), NotifyError> {
        self.rewrite_disk(queue, &records)?;
        state.queues.insert(queue.to_owned(), records);
        Ok(())
    }
}

fn read_records(file_path: &Path) -> Result<Vec<FileRecord>, NotifyError> {
    let file = OpenOptions::new()
        .read(true)
        .open(file_path)
        .map_err(|e| NotifyError::Store(e.to_string()))?;
    let mut records = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|e| NotifyError::Store(e.to_string()))?;
        if line.trim().is_empty() {
            continue;
        }
        let record: FileRecord =
            serde_json::from_str(&line).map_err(|e| NotifyError::Store(e.to_string()))?;
        records.push(record);
    }
    records.sort_by_key(|r| r.item.item_id);
    Ok(records)
}

impl QueueStore for FileStore {
    fn create_item(&self, queue: &str, data: &ItemData) -> Result<ItemId, NotifyError> {
        self.file_path(queue)?;
        let mut state = self.state.lock();
        let item_id = state.next_id;
        let mut records = state.queues.get(queue).cloned().unwrap_or_default();
        records.push(FileRecord {
            item: RawItem {
                item_id,
                queue: queue.to_owned(),
                created: now_secs(),
                data: data.clone(),
            },
            lease_expires_ms: None,
        });
        self.commit(&mut state, queue, records)?;
        state.next_id += 1;
        Ok(item_id)
    }

    fn claim_item(&self, queue: &str, lease: Duration) -> Result<Option<RawItem>, NotifyError> {
        let now = now_ms();
        let mut state = self.state.lock();
        let Some(records) = state.queues.get(queue) else {
            return Ok(None);
        };
        let Some(index) = records.iter().position(|r| r.claimable(now)) else {
            return Ok(None);
        };
        let mut staged = records.clone();
        staged[index].lease_expires_ms = Some(now + lease.as_millis());
        let item = staged[index].item.clone();
        self.commit(&mut state, queue, staged)?;
        Ok(Some(item))
    }

    fn delete_item(&self, item: &RawItem) -> Result<(), NotifyError> {
        let mut state = self.state.lock();
        let Some(records) = state.queues.get(&item.queue) else {
            return Ok(());
        };
        if !records.iter().any(|r| r.item.item_id == item.item_id) {
            return Ok(());
        }
        let staged: Vec<FileRecord> = records
            .iter()
            .filter(|r| r.item.item_id != item.item_id)
            .cloned()
            .collect();
        self.commit(&mut state, &item.queue, staged)
    }

    fn release_item(&self, item: &RawItem) -> Result<bool, NotifyError> {
        let mut state = self.state.lock();
        let Some(records) = state.queues.get(&item.queue) else {
            return Ok(false);
        };
        let Some(index) = records.iter().position(|r| r.item.item_id == item.item_id) else {
            return Ok(false);
        };
        let mut staged = records.clone();
        staged[index].lease_expires_ms = None;
        self.commit(&mut state, &item.queue, staged)?;
        Ok(true)
    }

    fn number_of_items(&self, queue: &str) -> Result<usize, NotifyError> {
        Ok(self.state.lock().queues.get(queue).map_or(0, Vec::len))
    }

    fn delete_queue(&self, queue: &str) -> Result<(), NotifyError> {
        let file_path = self.file_path(queue)?;
        let mut state = self.state.lock();
        if file_path.exists() {
            fs::remove_file(&file_path).map_err(|e| NotifyError::Store(e.to_string()))?;
        }
        state.queues.remove(queue);
        Ok(())
    }
}
