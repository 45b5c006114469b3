//! Key-value persistence used by the ledger.
//!
//! Everything the ledger persists is a string value under a string key, so
//! any backend able to `get`/`set`/`delete`/`exists` can host it.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::StoreError;

type ResultStore<T> = Result<T, StoreError>;

/// Minimal string key-value contract.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Returns the value stored under `key`, `None` when absent.
    async fn get(&self, key: &str) -> ResultStore<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> ResultStore<()>;

    /// Removes `key`. Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> ResultStore<()>;

    async fn exists(&self, key: &str) -> ResultStore<bool> {
        Ok(self.get(key).await?.is_some())
    }
}

/// In-process store, lost on restart.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sorted list of the stored keys.
    pub async fn keys(&self) -> Vec<String> {
        let guard = self.inner.lock().await;
        let mut keys: Vec<String> = guard.keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> ResultStore<Option<String>> {
        Ok(self.inner.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> ResultStore<()> {
        self.inner
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> ResultStore<()> {
        self.inner.lock().await.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> ResultStore<bool> {
        Ok(self.inner.lock().await.contains_key(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert_eq!(store.get("a").await.unwrap(), None);
        assert!(!store.exists("a").await.unwrap());

        store.set("a", "1").await.unwrap();
        store.set("a", "2").await.unwrap();
        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("2"));
        assert!(store.exists("a").await.unwrap());

        store.delete("a").await.unwrap();
        store.delete("a").await.unwrap();
        assert!(store.keys().await.is_empty());
    }
}
