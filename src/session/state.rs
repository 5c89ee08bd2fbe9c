//! Authentication state machine.

use super::Session;
use crate::cell::CellState;

/// Logical authentication state derived from the session cell.
///
/// Transitions:
/// - Unknown -> Authenticated (stored session found)
/// - Unknown -> Unauthenticated (nothing stored, or storage failed)
/// - Unauthenticated -> Authenticated (`sign_in`)
/// - Authenticated -> Unauthenticated (`sign_out`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthState {
    /// Stored session not read yet. Consumers must not redirect on this.
    #[default]
    Unknown,
    /// Loaded, no session.
    Unauthenticated,
    /// Loaded, session present.
    Authenticated,
}

impl AuthState {
    /// Derive the state from the loading flag and session presence.
    pub fn from_parts(is_loading: bool, has_session: bool) -> Self {
        match (is_loading, has_session) {
            (true, _) => AuthState::Unknown,
            (false, false) => AuthState::Unauthenticated,
            (false, true) => AuthState::Authenticated,
        }
    }

    /// Check if the state is settled (no longer `Unknown`).
    pub fn is_settled(&self) -> bool {
        !matches!(self, AuthState::Unknown)
    }

    /// Check if someone is signed in.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated)
    }
}

/// What UI consumers read: the session and whether it is authoritative yet.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionSnapshot {
    /// True until the stored session has been read.
    pub is_loading: bool,
    /// Current session, if any.
    pub session: Option<Session>,
    /// The stored session could not be read and was treated as absent.
    pub storage_unavailable: bool,
}

impl SessionSnapshot {
    /// Derived authentication state.
    pub fn auth_state(&self) -> AuthState {
        AuthState::from_parts(self.is_loading, self.session.is_some())
    }
}

impl From<CellState<Session>> for SessionSnapshot {
    fn from(state: CellState<Session>) -> Self {
        Self {
            is_loading: state.is_loading,
            session: state.value,
            storage_unavailable: state.load_failed,
        }
    }
}
