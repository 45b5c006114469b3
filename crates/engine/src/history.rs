//! Append-only, duplicate-free list of cycle ids per scope.
//!
//! Stored as a JSON array under `history:{group}:{user}`. The cycles
//! themselves stay the source of truth; the index is only used to enumerate
//! them.

use std::sync::Arc;

use crate::{KvStore, ResultLedger, Scope};

pub(crate) fn history_key(scope: Scope) -> String {
    format!("history:{}:{}", scope.group_id, scope.user_id)
}

#[derive(Clone)]
pub(crate) struct HistoryIndex {
    store: Arc<dyn KvStore>,
}

impl HistoryIndex {
    pub(crate) fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Ids of `scope` in insertion order.
    pub(crate) async fn list(&self, scope: Scope) -> ResultLedger<Vec<String>> {
        match self.store.get(&history_key(scope)).await? {
            Some(raw) if !raw.trim().is_empty() => Ok(serde_json::from_str(&raw)?),
            _ => Ok(Vec::new()),
        }
    }

    /// Appends `cycle_id` unless already present. Returns whether it was added.
    pub(crate) async fn append_if_absent(&self, scope: Scope, cycle_id: &str) -> ResultLedger<bool> {
        let mut ids = self.list(scope).await?;
        if ids.iter().any(|id| id == cycle_id) {
            return Ok(false);
        }
        ids.push(cycle_id.to_string());

        let raw = serde_json::to_string(&ids)?;
        self.store.set(&history_key(scope), &raw).await?;
        Ok(true)
    }
}
