use std::{collections::HashMap, sync::Arc};

use engine::Scope;
use tokio::sync::Mutex;

/// What the next plain message of a user is expected to be.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PendingAction {
    /// Opening income of a new cycle.
    Income,
    /// One ledger entry for the active cycle.
    Entry,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct Session {
    pub pending: Option<PendingAction>,
}

/// In-memory per-scope sessions, lost on restart.
#[derive(Clone, Default)]
pub(crate) struct SessionStore {
    inner: Arc<Mutex<HashMap<Scope, Session>>>,
}

impl SessionStore {
    pub(crate) async fn update<F>(&self, scope: Scope, f: F) -> Session
    where
        F: FnOnce(&mut Session),
    {
        let mut guard = self.inner.lock().await;
        let session = guard.entry(scope).or_default();
        f(session);
        session.clone()
    }

    /// Drops whatever `scope` had in flight.
    pub(crate) async fn clear(&self, scope: Scope) {
        self.inner.lock().await.remove(&scope);
    }

    /// Removes and returns the pending action of `scope`.
    pub(crate) async fn take_pending(&self, scope: Scope) -> Option<PendingAction> {
        let mut guard = self.inner.lock().await;
        let pending = guard.get_mut(&scope)?.pending.take();
        guard.remove(&scope);
        pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn pending_is_consumed_once() {
        let sessions = SessionStore::default();
        let scope = Scope::new(-5, 9);

        sessions
            .update(scope, |s| s.pending = Some(PendingAction::Entry))
            .await;

        assert_eq!(
            sessions.take_pending(scope).await,
            Some(PendingAction::Entry)
        );
        assert_eq!(sessions.take_pending(scope).await, None);
    }

    #[tokio::test]
    async fn clear_forgets_the_scope() {
        let sessions = SessionStore::default();
        let scope = Scope::new(-5, 9);
        sessions
            .update(scope, |s| s.pending = Some(PendingAction::Income))
            .await;

        sessions.clear(scope).await;
        sessions.clear(Scope::new(-5, 10)).await;

        assert!(sessions.inner.lock().await.is_empty());
        assert_eq!(sessions.take_pending(scope).await, None);
    }

    #[tokio::test]
    async fn users_of_a_chat_do_not_share_state() {
        let sessions = SessionStore::default();

        sessions
            .update(Scope::new(-5, 1), |s| s.pending = Some(PendingAction::Income))
            .await;

        assert_eq!(sessions.take_pending(Scope::new(-5, 2)).await, None);
        assert_eq!(
            sessions.take_pending(Scope::new(-5, 1)).await,
            Some(PendingAction::Income)
        );
    }
}
