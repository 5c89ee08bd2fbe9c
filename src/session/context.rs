//! Session provider shared with the UI tree.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info};

use super::{AuthState, Session, SessionSnapshot};
use crate::cell::{CellState, PersistentCell, WritePolicy};
use crate::storage::KeyValueStore;

/// Storage key owned by the session context.
pub const SESSION_KEY: &str = "session";

/// Single source of truth for "is anyone signed in right now".
///
/// Construct one at startup and hand clones to whatever needs it; clones
/// share the same underlying cell. Nothing else may write [`SESSION_KEY`].
///
/// `sign_in` and `sign_out` are synchronous: the new state is visible as
/// soon as they return, and persistence follows in the background.
#[derive(Debug, Clone)]
pub struct SessionContext {
    cell: Arc<PersistentCell<Session>>,
}

impl SessionContext {
    /// Mount the context over [`SESSION_KEY`] in `store`.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime.
    pub fn mount(store: Arc<dyn KeyValueStore>) -> Self {
        Self::mount_with(store, SESSION_KEY, WritePolicy::default())
    }

    /// Mount the context over an explicit key and write policy.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime.
    pub fn mount_with(
        store: Arc<dyn KeyValueStore>,
        key: impl Into<String>,
        policy: WritePolicy,
    ) -> Self {
        Self {
            cell: Arc::new(PersistentCell::open_with(store, key, policy)),
        }
    }

    /// Current authentication state.
    pub fn state(&self) -> AuthState {
        self.snapshot().auth_state()
    }

    /// Current session and loading flag.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.cell.state().into()
    }

    /// Current session, if any. Not authoritative while [`is_loading`](Self::is_loading).
    pub fn session(&self) -> Option<Session> {
        self.cell.state().value
    }

    /// True until the stored session has been read.
    pub fn is_loading(&self) -> bool {
        self.cell.state().is_loading
    }

    /// Subscribe to session changes.
    pub fn subscribe(&self) -> SessionWatcher {
        SessionWatcher {
            rx: self.cell.subscribe(),
        }
    }

    /// Store `session` as the active session.
    ///
    /// Refused (returns `false`) while a session is present; callers must
    /// `sign_out` first. Also refused while the stored session is still
    /// loading, since it may hold a session. A refused call schedules no write.
    pub fn sign_in(&self, session: Session) -> bool {
        let applied = self
            .cell
            .set_if(Some(session), |state| !state.is_loading && state.value.is_none());
        if applied {
            info!("signed in");
        } else if self.is_loading() {
            debug!("sign-in ignored, stored session not loaded yet");
        } else {
            debug!("sign-in ignored, a session is already active");
        }
        applied
    }

    /// Clear the active session.
    ///
    /// No-op (returns `false`) when nobody is signed in.
    pub fn sign_out(&self) -> bool {
        let applied = self.cell.set_if(None, |state| state.value.is_some());
        if applied {
            info!("signed out");
        } else {
            debug!("sign-out ignored, no active session");
        }
        applied
    }

    /// Wait until the stored session has been read.
    pub async fn loaded(&self) -> SessionSnapshot {
        self.cell.loaded().await.into()
    }

    /// Wait until every scheduled persistence write has settled.
    pub async fn flush(&self) {
        self.cell.flush().await;
    }

    /// Number of session writes that reached the store.
    pub fn completed_writes(&self) -> u64 {
        self.cell.completed_writes()
    }

    /// Number of session writes that were given up on.
    pub fn failed_writes(&self) -> u64 {
        self.cell.failed_writes()
    }
}

/// Subscription handle returned by [`SessionContext::subscribe`].
#[derive(Debug, Clone)]
pub struct SessionWatcher {
    rx: watch::Receiver<CellState<Session>>,
}

impl SessionWatcher {
    /// Latest snapshot, marking it as seen.
    pub fn current(&mut self) -> SessionSnapshot {
        self.rx.borrow_and_update().clone().into()
    }

    /// Wait for the next change.
    ///
    /// Returns `None` once the context and its worker are gone.
    pub async fn changed(&mut self) -> Option<SessionSnapshot> {
        self.rx.changed().await.ok()?;
        Some(self.current())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use serde_json::json;

    fn session(id: u64, token: &str) -> Session {
        Session::new(json!({"id": id, "token": token}))
    }

    #[tokio::test]
    async fn test_fresh_start_without_stored_session() {
        let store = Arc::new(MemoryStore::new());
        let ctx = SessionContext::mount(store);

        assert!(ctx.is_loading());
        assert!(ctx.session().is_none());
        assert_eq!(ctx.state(), AuthState::Unknown);

        let loaded = ctx.loaded().await;
        assert!(!loaded.is_loading);
        assert!(loaded.session.is_none());
        assert_eq!(ctx.state(), AuthState::Unauthenticated);
    }

    #[tokio::test]
    async fn test_sign_in_then_refuse_overwrite() {
        let store = Arc::new(MemoryStore::new());
        let ctx = SessionContext::mount(store);
        ctx.loaded().await;

        assert!(ctx.sign_in(session(1, "abc")));
        assert_eq!(ctx.state(), AuthState::Authenticated);
        assert_eq!(ctx.session(), Some(session(1, "abc")));

        assert!(!ctx.sign_in(session(2, "def")));
        assert_eq!(ctx.session(), Some(session(1, "abc")));

        ctx.flush().await;
        assert_eq!(ctx.completed_writes(), 1);
    }

    #[tokio::test]
    async fn test_sign_out_twice() {
        let store = Arc::new(MemoryStore::new());
        let ctx = SessionContext::mount(store);
        ctx.loaded().await;
        ctx.sign_in(session(1, "abc"));

        assert!(ctx.sign_out());
        assert_eq!(ctx.state(), AuthState::Unauthenticated);
        assert!(ctx.session().is_none());

        assert!(!ctx.sign_out());
        ctx.flush().await;
        assert_eq!(ctx.completed_writes(), 2);
    }

    #[tokio::test]
    async fn test_sign_out_then_sign_in_again() {
        let store = Arc::new(MemoryStore::new());
        let ctx = SessionContext::mount(store.clone());
        ctx.loaded().await;

        ctx.sign_in(session(1, "x"));
        ctx.sign_out();
        ctx.sign_in(session(2, "y"));
        ctx.flush().await;

        assert_eq!(ctx.session(), Some(session(2, "y")));
        assert_eq!(
            store.get_item(SESSION_KEY).await.unwrap(),
            Some(r#"{"id":2,"token":"y"}"#.to_string())
        );
    }

    #[tokio::test]
    async fn test_restart_restores_session() {
        let store = Arc::new(MemoryStore::new());
        {
            let ctx = SessionContext::mount(store.clone());
            ctx.loaded().await;
            ctx.sign_in(session(1, "abc"));
            ctx.flush().await;
        }

        let restarted = SessionContext::mount(store);
        let snapshot = restarted.loaded().await;
        assert!(!snapshot.is_loading);
        assert_eq!(snapshot.session, Some(session(1, "abc")));
        assert_eq!(restarted.state(), AuthState::Authenticated);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let store = Arc::new(MemoryStore::new());
        let ctx = SessionContext::mount(store);
        let consumer = ctx.clone();
        ctx.loaded().await;

        ctx.sign_in(session(3, "zzz"));
        assert_eq!(consumer.session(), Some(session(3, "zzz")));
        assert!(!consumer.sign_in(session(4, "other")));
    }

    #[tokio::test]
    async fn test_watcher_follows_transitions() {
        let store = Arc::new(MemoryStore::new());
        let ctx = SessionContext::mount(store);
        let mut watcher = ctx.subscribe();
        assert_eq!(watcher.current().auth_state(), AuthState::Unknown);

        let loaded = watcher.changed().await.unwrap();
        assert_eq!(loaded.auth_state(), AuthState::Unauthenticated);

        ctx.sign_in(session(1, "abc"));
        let signed_in = watcher.changed().await.unwrap();
        assert_eq!(signed_in.auth_state(), AuthState::Authenticated);

        ctx.sign_out();
        let signed_out = watcher.changed().await.unwrap();
        assert_eq!(signed_out.auth_state(), AuthState::Unauthenticated);
    }

    #[tokio::test]
    async fn test_sign_in_during_load_keeps_stored_session() {
        let store = Arc::new(MemoryStore::with_items([(
            SESSION_KEY,
            r#"{"id":1,"token":"X"}"#,
        )]));
        let ctx = SessionContext::mount(store.clone());

        assert!(ctx.is_loading());
        assert!(!ctx.sign_in(session(2, "Y")));

        let snapshot = ctx.loaded().await;
        assert_eq!(snapshot.session, Some(session(1, "X")));
        ctx.flush().await;
        assert_eq!(ctx.completed_writes(), 0);
        assert_eq!(
            store.get_item(SESSION_KEY).await.unwrap(),
            Some(r#"{"id":1,"token":"X"}"#.to_string())
        );
    }

    #[tokio::test]
    async fn test_sign_in_during_load_on_empty_store_is_refused() {
        let ctx = SessionContext::mount(Arc::new(MemoryStore::new()));
        assert!(!ctx.sign_in(session(1, "abc")));

        ctx.loaded().await;
        assert_eq!(ctx.state(), AuthState::Unauthenticated);
        assert!(ctx.sign_in(session(1, "abc")));
    }

    #[tokio::test]
    async fn test_stored_session_found_at_mount() {
        let store = Arc::new(MemoryStore::with_items([(SESSION_KEY, r#""legacy@x.com""#)]));
        let ctx = SessionContext::mount(store);

        let snapshot = ctx.loaded().await;
        assert_eq!(snapshot.session, Some(Session::new("legacy@x.com")));
        assert!(!ctx.sign_in(session(1, "abc")));
    }
}
