//! Registry of the group chats that used the bot.
//!
//! The set is loaded once at startup with [`ActiveChats::load`], mutated
//! under an exclusive lock and written back to the store on every change;
//! [`ActiveChats::flush`] persists it once more on shutdown.

use std::{collections::BTreeSet, sync::Arc};

use tokio::sync::RwLock;

use crate::{KvStore, ResultLedger};

const CHATS_KEY: &str = "bot:groups";

#[derive(Clone)]
pub struct ActiveChats {
    store: Arc<dyn KvStore>,
    inner: Arc<RwLock<BTreeSet<i64>>>,
}

impl ActiveChats {
    /// Reads the registry from `store`. A missing key is an empty registry.
    pub async fn load(store: Arc<dyn KvStore>) -> ResultLedger<Self> {
        let chats: BTreeSet<i64> = match store.get(CHATS_KEY).await? {
            Some(raw) if !raw.trim().is_empty() => serde_json::from_str(&raw)?,
            _ => BTreeSet::new(),
        };
        tracing::info!(count = chats.len(), "loaded active chats");

        Ok(Self {
            store,
            inner: Arc::new(RwLock::new(chats)),
        })
    }

    /// Registers `chat_id`. Returns `false` if it was already known.
    pub async fn add(&self, chat_id: i64) -> ResultLedger<bool> {
        let mut guard = self.inner.write().await;
        if !guard.insert(chat_id) {
            return Ok(false);
        }
        if let Err(err) = self.persist(&guard).await {
            guard.remove(&chat_id);
            return Err(err);
        }
        tracing::debug!(chat_id, "registered chat");
        Ok(true)
    }

    /// Forgets `chat_id`. Returns `false` if it was not registered.
    pub async fn remove(&self, chat_id: i64) -> ResultLedger<bool> {
        let mut guard = self.inner.write().await;
        if !guard.remove(&chat_id) {
            return Ok(false);
        }
        if let Err(err) = self.persist(&guard).await {
            guard.insert(chat_id);
            return Err(err);
        }
        tracing::debug!(chat_id, "unregistered chat");
        Ok(true)
    }

    pub async fn contains(&self, chat_id: i64) -> bool {
        self.inner.read().await.contains(&chat_id)
    }

    /// Registered chats in ascending order.
    pub async fn list(&self) -> Vec<i64> {
        self.inner.read().await.iter().copied().collect()
    }

    /// Writes the current set to the store.
    pub async fn flush(&self) -> ResultLedger<()> {
        let guard = self.inner.write().await;
        self.persist(&guard).await
    }

    async fn persist(&self, chats: &BTreeSet<i64>) -> ResultLedger<()> {
        let raw = serde_json::to_string(chats)?;
        self.store.set(CHATS_KEY, &raw).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;

    #[tokio::test]
    async fn registry_survives_reload() {
        let memory = MemoryStore::new();
        let chats = ActiveChats::load(Arc::new(memory.clone())).await.unwrap();

        assert!(chats.add(-300).await.unwrap());
        assert!(chats.add(-100).await.unwrap());
        assert!(!chats.add(-100).await.unwrap());
        assert!(chats.contains(-100).await);

        let reloaded = ActiveChats::load(Arc::new(memory.clone())).await.unwrap();
        assert_eq!(reloaded.list().await, vec![-300, -100]);

        assert!(reloaded.remove(-300).await.unwrap());
        assert!(!reloaded.remove(-300).await.unwrap());
        assert_eq!(
            memory.get(CHATS_KEY).await.unwrap().as_deref(),
            Some("[-100]")
        );
    }

    #[tokio::test]
    async fn flush_writes_empty_registry() {
        let memory = MemoryStore::new();
        let chats = ActiveChats::load(Arc::new(memory.clone())).await.unwrap();

        chats.flush().await.unwrap();

        assert_eq!(memory.get(CHATS_KEY).await.unwrap().as_deref(), Some("[]"));
    }
}
