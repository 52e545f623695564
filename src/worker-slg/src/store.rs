//! Durable batch-result storage.
//!
//! Batch results are written as soon as a batch finishes and read back once
//! during merge. The store only needs put, take, and cleanup; `take` removes
//! what it returns so results are consumed exactly once.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use core_slg::ScrapedPage;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Batch store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Batch result serialization failed: {0}")]
    Serde(#[from] serde_json::Error),
}

/// One batch's persisted output: scraped pages keyed by URL, in the order
/// the batch listed them. URLs that failed extraction are simply absent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchResult {
    pub batch_id: usize,
    pub content: IndexMap<String, ScrapedPage>,
}

impl BatchResult {
    pub fn new(batch_id: usize) -> Self {
        Self { batch_id, content: IndexMap::new() }
    }
}

#[async_trait]
pub trait BatchStore: Send + Sync {
    /// Persists one batch result under `(run_id, result.batch_id)`.
    async fn put(&self, run_id: &str, result: &BatchResult) -> Result<(), StoreError>;

    /// Removes and returns the result for `batch_id`, or `None` when the
    /// batch never completed.
    async fn take(&self, run_id: &str, batch_id: usize) -> Result<Option<BatchResult>, StoreError>;

    /// Drops everything stored for a run, completed or not.
    async fn clear_run(&self, run_id: &str) -> Result<(), StoreError>;
}

/// Filesystem-backed store: one JSON file per batch under
/// `<root>/<run_id>/batch-<id>.json`.
#[derive(Debug, Clone)]
pub struct FsBatchStore {
    root: PathBuf,
}

impl FsBatchStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn batch_path(&self, run_id: &str, batch_id: usize) -> PathBuf {
        self.root.join(run_id).join(format!("batch-{batch_id}.json"))
    }
}

#[async_trait]
impl BatchStore for FsBatchStore {
    async fn put(&self, run_id: &str, result: &BatchResult) -> Result<(), StoreError> {
        let path = self.batch_path(run_id, result.batch_id);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let payload = serde_json::to_vec(result)?;
        tokio::fs::write(&path, payload).await?;
        Ok(())
    }

    async fn take(&self, run_id: &str, batch_id: usize) -> Result<Option<BatchResult>, StoreError> {
        let path = self.batch_path(run_id, batch_id);
        let payload = match tokio::fs::read(&path).await {
            Ok(payload) => payload,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let result: BatchResult = serde_json::from_slice(&payload)?;
        tokio::fs::remove_file(&path).await?;
        Ok(Some(result))
    }

    async fn clear_run(&self, run_id: &str) -> Result<(), StoreError> {
        match tokio::fs::remove_dir_all(self.root.join(run_id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory store for tests and single-process runs.
#[derive(Debug, Default)]
pub struct MemoryBatchStore {
    inner: Mutex<HashMap<(String, usize), BatchResult>>,
}

impl MemoryBatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored results across all runs.
    pub fn len(&self) -> usize {
        self.inner.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl BatchStore for MemoryBatchStore {
    async fn put(&self, run_id: &str, result: &BatchResult) -> Result<(), StoreError> {
        if let Ok(mut map) = self.inner.lock() {
            map.insert((run_id.to_string(), result.batch_id), result.clone());
        }
        Ok(())
    }

    async fn take(&self, run_id: &str, batch_id: usize) -> Result<Option<BatchResult>, StoreError> {
        Ok(self
            .inner
            .lock()
            .ok()
            .and_then(|mut map| map.remove(&(run_id.to_string(), batch_id))))
    }

    async fn clear_run(&self, run_id: &str) -> Result<(), StoreError> {
        if let Ok(mut map) = self.inner.lock() {
            map.retain(|(rid, _), _| rid != run_id);
        }
        Ok(())
    }
}
