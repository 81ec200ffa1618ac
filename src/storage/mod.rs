//! Document store collaborator.
//!
//! Career statistics live in a keyed document store offering get, set,
//! query-by-field and server-assigned timestamps. Two backends ship here:
//! - `MemoryStore` for tests and one-shot runs
//! - `JsonlStore`, an append-only JSONL file per collection

mod jsonl;
mod memory;

pub use jsonl::*;
pub use memory::*;

use std::future::Future;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// A stored document.
pub type Document = serde_json::Value;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Store call timed out after {0} ms")]
    Timeout(u64),

    #[error("Store backend error: {0}")]
    Backend(String),

    #[error("Corrupt record on line {line} of {path:?}: {source}")]
    CorruptLine {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0:?} ends with an incomplete record")]
    TornWrite(PathBuf),
}

/// Keyed document store.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &'static str;

    async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>, StorageError>;

    /// Overwrite the whole document at `key`.
    async fn set(&self, collection: &str, key: &str, doc: Document) -> Result<(), StorageError>;

    /// All documents whose top-level `field` equals `value`, with their keys.
    async fn query(
        &self,
        collection: &str,
        field: &str,
        value: &Document,
    ) -> Result<Vec<(String, Document)>, StorageError>;

    /// Timestamp assigned by the store, never earlier than the last one issued.
    async fn server_timestamp(&self) -> Result<DateTime<Utc>, StorageError>;
}

/// Run a store call under a caller-level deadline.
pub async fn with_timeout<T, F>(limit: Duration, call: F) -> Result<T, StorageError>
where
    F: Future<Output = Result<T, StorageError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(StorageError::Timeout(limit.as_millis() as u64)),
    }
}

/// Clock that never goes backwards.
#[derive(Debug, Default)]
pub struct MonotonicClock {
    last: Mutex<Option<DateTime<Utc>>>,
}

impl MonotonicClock {
    pub fn now(&self) -> DateTime<Utc> {
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        let now = match *last {
            Some(prev) if prev > Utc::now() => prev,
            _ => Utc::now(),
        };
        *last = Some(now);
        now
    }
}

/// Configuration for storage paths.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl StorageConfig {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn collections_dir(&self) -> PathBuf {
        self.data_dir.join("collections")
    }

    pub fn collection_path(&self, collection: &str) -> PathBuf {
        self.collections_dir().join(format!("{}.jsonl", collection))
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(PathBuf::from("./data"))
    }
}
