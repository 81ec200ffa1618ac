//! In-memory document store.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use super::{Document, DocumentStore, MonotonicClock, StorageError};

/// Collections held in process memory, ordered by key.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, BTreeMap<String, Document>>>,
    clock: MonotonicClock,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a collection.
    pub async fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, BTreeMap::len)
    }

    pub async fn is_empty(&self, collection: &str) -> bool {
        self.len(collection).await == 0
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>, StorageError> {
        let collections = self.collections.read().await;
        Ok(collections.get(collection).and_then(|c| c.get(key)).cloned())
    }

    async fn set(&self, collection: &str, key: &str, doc: Document) -> Result<(), StorageError> {
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(key.to_string(), doc);
        debug!("Stored {}/{} in memory", collection, key);
        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        field: &str,
        value: &Document,
    ) -> Result<Vec<(String, Document)>, StorageError> {
        let collections = self.collections.read().await;
        let Some(docs) = collections.get(collection) else {
            return Ok(Vec::new());
        };
        Ok(docs
            .iter()
            .filter(|(_, doc)| doc.get(field) == Some(value))
            .map(|(key, doc)| (key.clone(), doc.clone()))
            .collect())
    }

    async fn server_timestamp(&self) -> Result<DateTime<Utc>, StorageError> {
        Ok(self.clock.now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let store = MemoryStore::new();
        assert!(store.get("playerStats", "nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let store = MemoryStore::new();
        store
            .set("playerStats", "u1_Asha", json!({"totalRuns": 10}))
            .await
            .unwrap();
        store
            .set("playerStats", "u1_Asha", json!({"totalRuns": 25}))
            .await
            .unwrap();

        let doc = store.get("playerStats", "u1_Asha").await.unwrap().unwrap();
        assert_eq!(doc, json!({"totalRuns": 25}));
        assert_eq!(store.len("playerStats").await, 1);
    }

    #[tokio::test]
    async fn test_query_by_field() {
        let store = MemoryStore::new();
        store
            .set("playerStats", "u1_Asha", json!({"userId": "u1"}))
            .await
            .unwrap();
        store
            .set("playerStats", "u2_Bilal", json!({"userId": "u2"}))
            .await
            .unwrap();
        store
            .set("playerStats", "u1_Chen", json!({"userId": "u1"}))
            .await
            .unwrap();

        let found = store
            .query("playerStats", "userId", &json!("u1"))
            .await
            .unwrap();
        let keys: Vec<&str> = found.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["u1_Asha", "u1_Chen"]);

        let none = store.query("other", "userId", &json!("u1")).await.unwrap();
        assert!(none.is_empty());
    }
}
