//! Persistent key-value cell.
//!
//! A [`PersistentCell`] gives a reactive view over one named entry in a
//! [`KeyValueStore`](crate::storage::KeyValueStore). The view is usable
//! immediately: it starts out loading, resolves once the initial read
//! settles, and afterwards reflects every `set` synchronously while the
//! store is updated in the background, one write at a time, in call order.

mod persistent;
mod state;

pub use persistent::PersistentCell;
pub use state::{CellState, WritePolicy};
