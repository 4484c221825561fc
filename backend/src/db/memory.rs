//! In-process document store.
//!
//! Used with `STORE_BACKEND=memory` for local runs and by the test suites.
//! Documents keep insertion order within a collection.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use super::store::{DocumentStore, Filter};
use super::StoreError;

#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<(String, Value)>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert(&self, collection: &str, key: &str, doc: Value) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();

        if docs.iter().any(|(k, _)| k == key) {
            return Err(StoreError::DuplicateKey(format!("{}/{}", collection, key)));
        }

        debug!("memory insert {}/{}", collection, key);
        docs.push((key.to_string(), doc));
        Ok(())
    }

    async fn replace(&self, collection: &str, key: &str, doc: Value) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        let slot = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|(k, _)| k == key))
            .ok_or_else(|| StoreError::NotFound(format!("{}/{}", collection, key)))?;

        slot.1 = doc;
        Ok(())
    }

    async fn delete(&self, collection: &str, key: &str) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        let docs = collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::NotFound(format!("{}/{}", collection, key)))?;

        let position = docs
            .iter()
            .position(|(k, _)| k == key)
            .ok_or_else(|| StoreError::NotFound(format!("{}/{}", collection, key)))?;

        docs.remove(position);
        Ok(())
    }

    async fn find_by_key(&self, collection: &str, key: &str) -> Result<Option<Value>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|(k, _)| k == key))
            .map(|(_, doc)| doc.clone()))
    }

    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Value>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|(_, doc)| filter.matches(doc))
                    .map(|(_, doc)| doc.clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
