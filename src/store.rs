//! Entry storage.
//!
//! [`MemoryStore`] keeps entries in memory and, when given a snapshot path,
//! rewrites a JSON snapshot after every mutation so entries survive restarts.
//! A mutation becomes visible only after its snapshot is written.

use crate::entry::HoldingEntry;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Another entry already uses this username key.
    #[error("username already taken: {0}")]
    Duplicate(String),

    /// Snapshot could not be read or written.
    #[error("snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot could not be encoded or decoded.
    #[error("snapshot encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Create/find/delete over holding entries.
#[async_trait]
pub trait EntryStore: Send + Sync {
    /// Find an entry by lowercased username.
    async fn find_by_key(&self, username_key: &str) -> StoreResult<Option<HoldingEntry>>;

    /// Insert an entry; fails if the username key is taken.
    async fn create(&self, entry: HoldingEntry) -> StoreResult<HoldingEntry>;

    /// All entries, in insertion order.
    async fn list(&self) -> StoreResult<Vec<HoldingEntry>>;

    /// Up to `limit` entries, oldest first.
    async fn list_oldest(&self, limit: usize) -> StoreResult<Vec<HoldingEntry>>;

    /// Delete entries by id and return how many were removed.
    async fn delete_many(&self, ids: &[Uuid]) -> StoreResult<usize>;

    /// Delete everything and return how many were removed.
    async fn clear(&self) -> StoreResult<usize>;
}

/// In-memory store with optional JSON snapshot.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<Vec<HoldingEntry>>,
    /// Serializes mutations across the snapshot write.
    writer: Mutex<()>,
    snapshot: Option<PathBuf>,
}

impl MemoryStore {
    /// Create an empty, purely in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a store backed by a snapshot file, loading it if it exists.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing snapshot cannot be read or decoded.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let entries = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let entries: Vec<HoldingEntry> = serde_json::from_str(&content)?;
            info!("Loaded {} entries from {}", entries.len(), path.display());
            entries
        } else {
            Vec::new()
        };

        Ok(Self {
            entries: RwLock::new(entries),
            writer: Mutex::new(()),
            snapshot: Some(path.to_path_buf()),
        })
    }

    /// Create a store pre-populated with `entries`.
    #[must_use]
    pub fn with_entries(entries: Vec<HoldingEntry>) -> Self {
        Self {
            entries: RwLock::new(entries),
            writer: Mutex::new(()),
            snapshot: None,
        }
    }

    /// Write `next` to the snapshot, then make it the live entry set.
    ///
    /// Callers must hold `writer`. On a failed write the live set is left
    /// untouched.
    async fn commit(&self, next: Vec<HoldingEntry>) -> StoreResult<()> {
        if let Some(path) = &self.snapshot {
            let content = serde_json::to_string_pretty(&next)?;
            tokio::fs::write(path, content).await?;
            debug!("Wrote {} entries to {}", next.len(), path.display());
        }
        *self.entries.write() = next;
        Ok(())
    }
}

#[async_trait]
impl EntryStore for MemoryStore {
    async fn find_by_key(&self, username_key: &str) -> StoreResult<Option<HoldingEntry>> {
        Ok(self
            .entries
            .read()
            .iter()
            .find(|e| e.username_key == username_key)
            .cloned())
    }

    async fn create(&self, entry: HoldingEntry) -> StoreResult<HoldingEntry> {
        let _guard = self.writer.lock().await;
        let mut next = self.entries.read().clone();
        if next.iter().any(|e| e.username_key == entry.username_key) {
            return Err(StoreError::Duplicate(entry.username_key));
        }
        next.push(entry.clone());
        self.commit(next).await?;
        Ok(entry)
    }

    async fn list(&self) -> StoreResult<Vec<HoldingEntry>> {
        Ok(self.entries.read().clone())
    }

    async fn list_oldest(&self, limit: usize) -> StoreResult<Vec<HoldingEntry>> {
        let mut entries = self.entries.read().clone();
        entries.sort_by_key(|e| e.created_at);
        entries.truncate(limit);
        Ok(entries)
    }

    async fn delete_many(&self, ids: &[Uuid]) -> StoreResult<usize> {
        let ids: HashSet<&Uuid> = ids.iter().collect();
        let _guard = self.writer.lock().await;
        let mut next = self.entries.read().clone();
        let before = next.len();
        next.retain(|e| !ids.contains(&e.id));
        let removed = before - next.len();
        if removed > 0 {
            self.commit(next).await?;
        }
        Ok(removed)
    }

    async fn clear(&self) -> StoreResult<usize> {
        let _guard = self.writer.lock().await;
        let removed = self.entries.read().len();
        self.commit(Vec::new()).await?;
        Ok(removed)
    }
}
