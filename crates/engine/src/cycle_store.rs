//! Persistence of [`Cycle`]s and of the per-scope active pointer.
//!
//! A cycle is stored as one JSON string under `cycle:{id}`; the id of the
//! active cycle of a scope lives under `activeCycle:{group}:{user}`.

use std::sync::Arc;

use crate::{Cycle, KvStore, ResultLedger, Scope};

pub(crate) fn cycle_key(cycle_id: &str) -> String {
    format!("cycle:{cycle_id}")
}

pub(crate) fn active_key(scope: Scope) -> String {
    format!("activeCycle:{}:{}", scope.group_id, scope.user_id)
}

/// What the active pointer of a scope resolves to.
#[derive(Debug)]
pub(crate) enum Active {
    None,
    /// The pointer references a cycle that is no longer stored, has already
    /// ended, or belongs to another scope.
    Dangling(String),
    Cycle(Cycle),
}

#[derive(Clone)]
pub(crate) struct CycleStore {
    store: Arc<dyn KvStore>,
}

impl CycleStore {
    pub(crate) fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    pub(crate) async fn load(&self, cycle_id: &str) -> ResultLedger<Option<Cycle>> {
        match self.store.get(&cycle_key(cycle_id)).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub(crate) async fn save(&self, cycle: &Cycle) -> ResultLedger<()> {
        let raw = serde_json::to_string(cycle)?;
        self.store.set(&cycle_key(&cycle.id), &raw).await?;
        Ok(())
    }

    pub(crate) async fn active_id(&self, scope: Scope) -> ResultLedger<Option<String>> {
        Ok(self
            .store
            .get(&active_key(scope))
            .await?
            .filter(|id| !id.trim().is_empty()))
    }

    pub(crate) async fn set_active(&self, scope: Scope, cycle_id: &str) -> ResultLedger<()> {
        self.store.set(&active_key(scope), cycle_id).await?;
        Ok(())
    }

    pub(crate) async fn clear_active(&self, scope: Scope) -> ResultLedger<()> {
        self.store.delete(&active_key(scope)).await?;
        Ok(())
    }

    /// Follows the active pointer of `scope`.
    ///
    /// Only a stored, still active cycle of the same scope counts; a pointer
    /// left behind by a failed clear resolves to [`Active::Dangling`].
    pub(crate) async fn active(&self, scope: Scope) -> ResultLedger<Active> {
        let Some(cycle_id) = self.active_id(scope).await? else {
            return Ok(Active::None);
        };
        match self.load(&cycle_id).await? {
            Some(cycle) if cycle.is_active && cycle.scope() == scope => Ok(Active::Cycle(cycle)),
            _ => Ok(Active::Dangling(cycle_id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::{LedgerError, MemoryStore, Money};

    fn store() -> (MemoryStore, CycleStore) {
        let memory = MemoryStore::new();
        let cycles = CycleStore::new(Arc::new(memory.clone()));
        (memory, cycles)
    }

    #[test]
    fn keys_follow_the_documented_layout() {
        assert_eq!(cycle_key("abc"), "cycle:abc");
        assert_eq!(active_key(Scope::new(-42, 7)), "activeCycle:-42:7");
    }

    #[tokio::test]
    async fn save_then_load() {
        let (_, cycles) = store();
        let cycle = Cycle::new(Scope::new(1, 2), Money::new(10), Utc::now(), Duration::days(7));

        cycles.save(&cycle).await.unwrap();

        assert_eq!(cycles.load(&cycle.id).await.unwrap(), Some(cycle));
        assert_eq!(cycles.load("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn active_pointer_states() {
        let (memory, cycles) = store();
        let scope = Scope::new(1, 2);
        assert!(matches!(cycles.active(scope).await.unwrap(), Active::None));

        cycles.set_active(scope, "ghost").await.unwrap();
        assert!(matches!(
            cycles.active(scope).await.unwrap(),
            Active::Dangling(id) if id == "ghost"
        ));

        let cycle = Cycle::new(scope, Money::ZERO, Utc::now(), Duration::days(7));
        cycles.save(&cycle).await.unwrap();
        cycles.set_active(scope, &cycle.id).await.unwrap();
        assert!(matches!(cycles.active(scope).await.unwrap(), Active::Cycle(c) if c == cycle));

        cycles.clear_active(scope).await.unwrap();
        assert!(!memory.exists(&active_key(scope)).await.unwrap());
    }

    #[tokio::test]
    async fn pointer_to_an_ended_cycle_is_dangling() {
        let (_, cycles) = store();
        let scope = Scope::new(1, 2);
        let now = Utc::now();
        let mut cycle = Cycle::new(scope, Money::ZERO, now, Duration::days(7));
        cycle.close(now);
        cycles.save(&cycle).await.unwrap();
        cycles.set_active(scope, &cycle.id).await.unwrap();

        assert!(matches!(
            cycles.active(scope).await.unwrap(),
            Active::Dangling(id) if id == cycle.id
        ));
    }

    #[tokio::test]
    async fn pointer_to_another_scope_is_dangling() {
        let (_, cycles) = store();
        let cycle = Cycle::new(Scope::new(1, 3), Money::ZERO, Utc::now(), Duration::days(7));
        cycles.save(&cycle).await.unwrap();
        cycles.set_active(Scope::new(1, 2), &cycle.id).await.unwrap();

        assert!(matches!(
            cycles.active(Scope::new(1, 2)).await.unwrap(),
            Active::Dangling(_)
        ));
    }

    #[tokio::test]
    async fn corrupt_record_is_a_persistence_error() {
        let (memory, cycles) = store();
        memory.set(&cycle_key("bad"), "{not json").await.unwrap();

        let err = cycles.load("bad").await.unwrap_err();
        assert!(matches!(err, LedgerError::Persistence(_)));
    }
}
