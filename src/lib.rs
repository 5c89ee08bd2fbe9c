//! # session-ctx
//!
//! Persistent session context for the post it! student-management app.
//!
//! The crate keeps track of who is signed in. A session obtained from the
//! auth API is held in memory, exposed to any number of UI consumers, and
//! persisted locally so it survives a restart.
//!
//! ## Features
//!
//! - **Persistent cell**: observable `(is_loading, value)` view over one
//!   storage key, usable before the stored value has been read
//! - **Ordered persistence**: writes for a key run one at a time, in call order
//! - **Session context**: `sign_in` / `sign_out` with refuse-while-active policy
//! - **Fail-open storage**: unreadable storage means "signed out", never a hang
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use serde_json::json;
//! use session_ctx::{FileStore, Session, SessionContext};
//!
//! #[tokio::main]
//! async fn main() {
//!     session_ctx::logging::try_init().ok();
//!
//!     let store = Arc::new(FileStore::new("session-ctx.json"));
//!     let ctx = SessionContext::mount(store);
//!
//!     // Wait for the stored session before deciding where to route.
//!     let snapshot = ctx.loaded().await;
//!     if snapshot.session.is_none() {
//!         ctx.sign_in(Session::new(json!({"id": 1, "token": "abc"})));
//!     }
//!
//!     ctx.flush().await;
//! }
//! ```

pub mod auth;
pub mod cell;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod session;
pub mod storage;

// Re-export commonly used types
pub use auth::{AuthApi, HttpAuthApi, LoginRequest, RegisterForm, ValidationError};
pub use cell::{CellState, PersistentCell, WritePolicy};
pub use error::{Result, SessionCtxError};
pub use session::{AuthState, Session, SessionContext, SessionSnapshot, SessionWatcher, SESSION_KEY};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
