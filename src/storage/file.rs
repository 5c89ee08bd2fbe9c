//! File-backed key-value store.
//!
//! All keys live in one JSON object on disk. Every mutation rewrites the
//! whole document through a temporary file followed by a rename, so a crash
//! mid-write leaves either the old or the new document, never a torn one.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, trace, warn};

use super::KeyValueStore;
use crate::error::SessionCtxError;
use crate::Result;

type Document = BTreeMap<String, String>;

/// Durable key-value store kept in a single JSON file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles on the document.
    lock: Mutex<()>,
}

impl FileStore {
    /// Create a store backed by the file at `path`.
    ///
    /// The file and its parent directory are created lazily on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Path of the backing document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Document> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(Document::new()),
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                SessionCtxError::Storage(format!(
                    "corrupt store document {}: {}",
                    self.path.display(),
                    e
                ))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Document::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Load the document for a read-modify-write cycle.
    ///
    /// A corrupt document is replaced by an empty one, so the next save
    /// repairs the file. Keys it held are lost.
    async fn load_for_write(&self) -> Result<Document> {
        match self.load().await {
            Err(SessionCtxError::Storage(reason)) => {
                warn!(%reason, "discarding unreadable store document");
                Ok(Document::new())
            }
            other => other,
        }
    }

    async fn save(&self, doc: &Document) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let tmp = self.path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(doc)?;
        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        trace!(path = %self.path.display(), keys = doc.len(), "store document saved");
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock().await;
        let mut doc = self.load().await?;
        Ok(doc.remove(key))
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut doc = self.load_for_write().await?;
        doc.insert(key.to_string(), value.to_string());
        self.save(&doc).await
    }

    async fn delete_item(&self, key: &str) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut doc = self.load_for_write().await?;
        if doc.remove(key).is_none() {
            debug!(key, "delete of absent key");
            return Ok(());
        }
        self.save(&doc).await
    }
}
