//! Session management module.
//!
//! This module provides the session payload type, the derived authentication
//! state, and the [`SessionContext`] provider that owns the persisted session
//! slot.

mod context;
mod payload;
mod state;

pub use context::{SessionContext, SessionWatcher, SESSION_KEY};
pub use payload::Session;
pub use state::{AuthState, SessionSnapshot};
