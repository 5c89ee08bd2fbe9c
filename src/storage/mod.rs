//! Key-value storage abstraction.
//!
//! The session core never talks to a platform store directly. It goes
//! through [`KeyValueStore`], an async get/set/delete primitive over string
//! values. Two implementations ship with the crate:
//!
//! - [`MemoryStore`]: process-local map, useful for tests and for simulating
//!   a restart by reopening cells over the same store.
//! - [`FileStore`]: a single JSON document on disk, written atomically.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;

use crate::Result;

/// Async key-value primitive backing persistent cells.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, or `None` if absent.
    async fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`. Removing an absent key is not an error.
    async fn delete_item(&self, key: &str) -> Result<()>;
}
