//! History store port and its in-memory and file-backed implementations.

use async_trait::async_trait;
use sf_protocol::history_models::HistoryItem;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Default number of snapshots kept.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to access history file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to (de)serialize history file {path}: {source}")]
    Serialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Save/load capability for project snapshots.
///
/// Items are listed newest first and keyed by project id.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Insert or replace the snapshot for `item.id` and move it to the front.
    async fn save(&self, item: HistoryItem) -> StoreResult<()>;

    async fn list(&self) -> StoreResult<Vec<HistoryItem>>;

    async fn get(&self, id: Uuid) -> StoreResult<Option<HistoryItem>>;

    /// Returns true when a snapshot was removed.
    async fn delete(&self, id: Uuid) -> StoreResult<bool>;
}

/// Put `item` at the front, drop older copies of the same project and cap
/// the list at `limit`.
fn upsert(items: &mut Vec<HistoryItem>, item: HistoryItem, limit: usize) {
    items.retain(|existing| existing.id != item.id);
    items.insert(0, item);
    items.truncate(limit);
}

/// Keeps snapshots for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct MemoryHistoryStore {
    items: Arc<Mutex<Vec<HistoryItem>>>,
    limit: usize,
}

impl MemoryHistoryStore {
    pub fn new(limit: usize) -> Self {
        Self {
            items: Arc::new(Mutex::new(Vec::new())),
            limit,
        }
    }
}

impl Default for MemoryHistoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn save(&self, item: HistoryItem) -> StoreResult<()> {
        let mut items = self.items.lock().await;
        upsert(&mut items, item, self.limit);
        Ok(())
    }

    async fn list(&self) -> StoreResult<Vec<HistoryItem>> {
        Ok(self.items.lock().await.clone())
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<HistoryItem>> {
        let items = self.items.lock().await;
        Ok(items.iter().find(|item| item.id == id).cloned())
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let mut items = self.items.lock().await;
        let before = items.len();
        items.retain(|item| item.id != id);
        Ok(items.len() != before)
    }
}

/// Keeps snapshots in a single JSON array file.
///
/// Every operation reads the whole file; writes go through a lock so
/// concurrent saves from one process do not interleave.
#[derive(Debug, Clone)]
pub struct FileHistoryStore {
    path: PathBuf,
    limit: usize,
    lock: Arc<Mutex<()>>,
}

impl FileHistoryStore {
    pub fn new(path: impl Into<PathBuf>, limit: usize) -> Self {
        Self {
            path: path.into(),
            limit,
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    async fn read_items(&self) -> StoreResult<Vec<HistoryItem>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.io_error(e)),
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&content).map_err(|source| StoreError::Serialization {
            path: self.path.clone(),
            source,
        })
    }

    async fn write_items(&self, items: &[HistoryItem]) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }
        let content =
            serde_json::to_string_pretty(items).map_err(|source| StoreError::Serialization {
                path: self.path.clone(),
                source,
            })?;
        tokio::fs::write(&self.path, content)
            .await
            .map_err(|e| self.io_error(e))
    }
}

#[async_trait]
impl HistoryStore for FileHistoryStore {
    async fn save(&self, item: HistoryItem) -> StoreResult<()> {
        let _guard = self.lock.lock().await;
        let mut items = self.read_items().await?;
        upsert(&mut items, item, self.limit);
        self.write_items(&items).await
    }

    async fn list(&self) -> StoreResult<Vec<HistoryItem>> {
        let _guard = self.lock.lock().await;
        self.read_items().await
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<HistoryItem>> {
        let _guard = self.lock.lock().await;
        Ok(self.read_items().await?.into_iter().find(|item| item.id == id))
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let _guard = self.lock.lock().await;
        let mut items = self.read_items().await?;
        let before = items.len();
        items.retain(|item| item.id != id);
        if items.len() == before {
            return Ok(false);
        }
        self.write_items(&items).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::project::create_project;
    use sf_protocol::project_models::Theme;

    fn item(prompt: &str) -> HistoryItem {
        HistoryItem::snapshot(&create_project(prompt, Theme::Ocean))
    }

    #[tokio::test]
    async fn test_memory_store_upserts_newest_first() {
        let store = MemoryHistoryStore::new(10);
        let first = item("first");
        let second = item("second");

        store.save(first.clone()).await.unwrap();
        store.save(second.clone()).await.unwrap();
        store.save(first.clone()).await.unwrap();

        let ids: Vec<Uuid> = store.list().await.unwrap().iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);
    }

    #[tokio::test]
    async fn test_memory_store_caps_at_limit() {
        let store = MemoryHistoryStore::new(2);
        for prompt in ["a", "b", "c"] {
            store.save(item(prompt)).await.unwrap();
        }

        let prompts: Vec<String> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.prompt)
            .collect();
        assert_eq!(prompts, vec!["c", "b"]);
    }

    #[tokio::test]
    async fn test_memory_store_get_and_delete() {
        let store = MemoryHistoryStore::default();
        let saved = item("a todo app");
        store.save(saved.clone()).await.unwrap();

        assert_eq!(store.get(saved.id).await.unwrap(), Some(saved.clone()));
        assert!(store.delete(saved.id).await.unwrap());
        assert!(!store.delete(saved.id).await.unwrap());
        assert_eq!(store.get(saved.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileHistoryStore::new(dir.path().join("nested/history.json"), 10);
        assert!(store.list().await.unwrap().is_empty());
    }
}
