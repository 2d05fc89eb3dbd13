// src/core/store.rs

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::core::error::StoreError;
use crate::core::models::OutcomeRecord;

/// Durable history of outcome records, one owner per record.
///
/// Implementations must accept concurrent `save` calls from different
/// batches; each call is applied atomically.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Stores the current snapshot of `record`, replacing an earlier snapshot
    /// with the same id. Fails with `StoreError::TerminalRecord` when the
    /// stored snapshot is already `success` or `failed`.
    async fn save(&self, record: &OutcomeRecord) -> Result<(), StoreError>;

    /// All records owned by `user`, most recent first.
    async fn history(&self, user: &str) -> Result<Vec<OutcomeRecord>, StoreError>;
}

/// Latest snapshot per record, in first-insertion order.
#[derive(Debug, Default)]
struct RecordIndex {
    records: Vec<OutcomeRecord>,
}

impl RecordIndex {
    fn check(&self, record: &OutcomeRecord) -> Result<Option<usize>, StoreError> {
        match self.records.iter().position(|r| r.id == record.id) {
            Some(i) if self.records[i].is_terminal() => Err(StoreError::TerminalRecord(record.id)),
            found => Ok(found),
        }
    }

    fn put(&mut self, slot: Option<usize>, record: OutcomeRecord) {
        match slot {
            Some(i) => self.records[i] = record,
            None => self.records.push(record),
        }
    }

    // Replays a snapshot read back from disk; the last one for an id wins.
    fn replay(&mut self, record: OutcomeRecord) {
        let slot = self.records.iter().position(|r| r.id == record.id);
        self.put(slot, record);
    }

    fn history(&self, user: &str) -> Vec<OutcomeRecord> {
        let mut owned: Vec<OutcomeRecord> =
            self.records.iter().rev().filter(|r| r.user == user).cloned().collect();
        // Stable sort: for equal timestamps the later insertion stays first.
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        owned
    }
}

/// In-process store.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    index: Mutex<RecordIndex>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn save(&self, record: &OutcomeRecord) -> Result<(), StoreError> {
        let mut index = self.index.lock().await;
        let slot = index.check(record)?;
        index.put(slot, record.clone());
        Ok(())
    }

    async fn history(&self, user: &str) -> Result<Vec<OutcomeRecord>, StoreError> {
        Ok(self.index.lock().await.history(user))
    }
}

/// Append-only JSON-lines file.
///
/// Every save writes one full snapshot line. Reopening the file replays all
/// lines, so a crash in the middle of polling leaves the `in_progress`
/// snapshot behind.
#[derive(Debug)]
pub struct JsonlRecordStore {
    path: PathBuf,
    index: Mutex<RecordIndex>,
}

impl JsonlRecordStore {
    /// Opens (or creates) the history file at `path`.
    ///
    /// Lines that fail to parse are skipped with a warning so one torn write
    /// does not hide the rest of the history.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let mut index = RecordIndex::default();
        match fs::read_to_string(&path).await {
            Ok(contents) => {
                for (number, line) in contents.lines().enumerate().filter(|(_, l)| !l.trim().is_empty()) {
                    match serde_json::from_str::<OutcomeRecord>(line) {
                        Ok(record) => index.replay(record),
                        Err(e) => warn!(path = %path.display(), line = number + 1, error = %e, "Skipping unreadable history line."),
                    }
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        info!(path = %path.display(), records = index.records.len(), "History opened.");
        Ok(Self { path, index: Mutex::new(index) })
    }
}

#[async_trait]
impl RecordStore for JsonlRecordStore {
    async fn save(&self, record: &OutcomeRecord) -> Result<(), StoreError> {
        // Held across the write so lines from concurrent saves never interleave.
        let mut index = self.index.lock().await;
        let slot = index.check(record)?;

        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path).await?;
        file.write_all(&line).await?;
        file.sync_data().await?;

        debug!(record = %record.id, status = %record.status, "Snapshot appended.");
        index.put(slot, record.clone());
        Ok(())
    }

    async fn history(&self, user: &str) -> Result<Vec<OutcomeRecord>, StoreError> {
        Ok(self.index.lock().await.history(user))
    }
}
