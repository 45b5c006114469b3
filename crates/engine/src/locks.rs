//! Per-scope exclusive sections.
//!
//! Every read-modify-write of a scope's cycle runs while holding the scope's
//! guard, so two appends on the same scope can't overwrite each other.
//! Distinct scopes never wait on each other.

use std::{collections::HashMap, sync::Arc};

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::Scope;

/// Entries above this count trigger a sweep of idle locks.
const PRUNE_THRESHOLD: usize = 1024;

#[derive(Default)]
pub(crate) struct ScopeLocks {
    inner: Mutex<HashMap<Scope, Arc<Mutex<()>>>>,
}

impl ScopeLocks {
    pub(crate) async fn acquire(&self, scope: Scope) -> OwnedMutexGuard<()> {
        let lock = {
            let mut guard = self.inner.lock().await;
            if guard.len() > PRUNE_THRESHOLD {
                guard.retain(|_, lock| Arc::strong_count(lock) > 1);
            }
            guard.entry(scope).or_default().clone()
        };
        lock.lock_owned().await
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }
}
