//! Persistent cell implementation.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, trace, warn};

use super::{CellState, WritePolicy};
use crate::storage::KeyValueStore;

/// Work item for the cell worker.
enum Op {
    /// Store the encoded value, or delete the key when `None`.
    Persist(Option<String>),
    /// Acknowledge once every earlier op has settled.
    Flush(oneshot::Sender<()>),
}

#[derive(Debug, Default)]
struct Counters {
    completed: AtomicU64,
    failed: AtomicU64,
}

/// Reactive view over one key in a [`KeyValueStore`].
///
/// Values are stored as JSON strings. All storage traffic for the key runs
/// on a single background worker: first the initial read, then every write
/// in the order the `set` calls were made.
pub struct PersistentCell<T> {
    key: Arc<str>,
    state: Arc<watch::Sender<CellState<T>>>,
    queue: mpsc::UnboundedSender<Op>,
    touched: Arc<AtomicBool>,
    counters: Arc<Counters>,
}

impl<T> PersistentCell<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Open a cell over `key` with the default write policy.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime.
    pub fn open(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self::open_with(store, key, WritePolicy::default())
    }

    /// Open a cell over `key` with an explicit write policy.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime.
    pub fn open_with(
        store: Arc<dyn KeyValueStore>,
        key: impl Into<String>,
        policy: WritePolicy,
    ) -> Self {
        let key: Arc<str> = Arc::from(key.into());
        let (tx, _rx) = watch::channel(CellState::loading());
        let state = Arc::new(tx);
        let (queue, ops) = mpsc::unbounded_channel();
        let touched = Arc::new(AtomicBool::new(false));
        let counters = Arc::new(Counters::default());

        let worker = Worker {
            store,
            key: Arc::clone(&key),
            state: Arc::clone(&state),
            touched: Arc::clone(&touched),
            counters: Arc::clone(&counters),
            policy,
        };
        tokio::spawn(worker.run(ops));
        debug!(key = %key, "cell opened");

        Self {
            key,
            state,
            queue,
            touched,
            counters,
        }
    }

    /// Key this cell is bound to.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Current snapshot.
    pub fn state(&self) -> CellState<T> {
        self.state.borrow().clone()
    }

    /// Subscribe to state changes.
    ///
    /// The receiver starts at the current state; `changed()` resolves on
    /// every later update.
    pub fn subscribe(&self) -> watch::Receiver<CellState<T>> {
        self.state.subscribe()
    }

    /// Replace the value.
    ///
    /// The in-memory state changes before this returns. The store is
    /// updated in the background (`None` deletes the key).
    pub fn set(&self, value: Option<T>) {
        self.apply(value, |_| true);
    }

    /// Replace the value only if `predicate` accepts the current state.
    ///
    /// The check and the update happen atomically. Returns whether the value
    /// was replaced; a rejected update schedules no write.
    pub fn set_if<F>(&self, value: Option<T>, predicate: F) -> bool
    where
        F: FnOnce(&CellState<T>) -> bool,
    {
        self.apply(value, predicate)
    }

    /// Wait until the initial read has settled and return that state.
    pub async fn loaded(&self) -> CellState<T> {
        let mut rx = self.state.subscribe();
        let state = match rx.wait_for(|s| !s.is_loading).await {
            Ok(state) => state.clone(),
            Err(_) => return self.state(),
        };
        state
    }

    /// Wait until every write scheduled so far has settled.
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.queue.send(Op::Flush(done)).is_ok() {
            let _ = wait.await;
        }
    }

    /// Number of writes that reached the store.
    pub fn completed_writes(&self) -> u64 {
        self.counters.completed.load(Ordering::Relaxed)
    }

    /// Number of writes given up on after exhausting the write policy.
    pub fn failed_writes(&self) -> u64 {
        self.counters.failed.load(Ordering::Relaxed)
    }

    fn apply<F>(&self, value: Option<T>, predicate: F) -> bool
    where
        F: FnOnce(&CellState<T>) -> bool,
    {
        let encoded = match value.as_ref().map(serde_json::to_string).transpose() {
            Ok(encoded) => Some(encoded),
            Err(e) => {
                warn!(key = %self.key, error = %e, "value not serializable, keeping it in memory only");
                None
            }
        };

        // Enqueue under the state lock so queue order matches update order.
        self.state.send_if_modified(|state| {
            if !predicate(state) {
                return false;
            }
            state.value = value;
            self.touched.store(true, Ordering::SeqCst);

            match encoded {
                Some(encoded) => {
                    if self.queue.send(Op::Persist(encoded)).is_err() {
                        warn!(key = %self.key, "cell worker gone, write dropped");
                        self.counters.failed.fetch_add(1, Ordering::Relaxed);
                    }
                }
                None => {
                    self.counters.failed.fetch_add(1, Ordering::Relaxed);
                }
            }
            true
        })
    }
}

impl<T> fmt::Debug for PersistentCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersistentCell")
            .field("key", &self.key)
            .field("completed_writes", &self.counters.completed.load(Ordering::Relaxed))
            .field("failed_writes", &self.counters.failed.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

/// Background task owning all storage traffic for one key.
struct Worker<T> {
    store: Arc<dyn KeyValueStore>,
    key: Arc<str>,
    state: Arc<watch::Sender<CellState<T>>>,
    touched: Arc<AtomicBool>,
    counters: Arc<Counters>,
    policy: WritePolicy,
}

impl<T> Worker<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    async fn run(self, mut ops: mpsc::UnboundedReceiver<Op>) {
        let loaded = self.read().await;
        let touched = &self.touched;
        let key = &self.key;

        self.state.send_modify(|state| {
            state.is_loading = false;
            match loaded {
                Some(value) => {
                    // A set issued during the read is newer than the stored value.
                    if touched.load(Ordering::SeqCst) {
                        debug!(key = %key, "stored value superseded by in-flight update");
                    } else {
                        state.value = value;
                    }
                }
                None => state.load_failed = true,
            }
        });

        while let Some(op) = ops.recv().await {
            match op {
                Op::Persist(encoded) => self.persist(encoded).await,
                Op::Flush(done) => {
                    let _ = done.send(());
                }
            }
        }

        trace!(key = %self.key, "cell worker stopped");
    }

    /// Initial read. `None` means the read failed and the cell fails open.
    async fn read(&self) -> Option<Option<T>> {
        match self.store.get_item(&self.key).await {
            Ok(None) => {
                debug!(key = %self.key, "no stored value");
                Some(None)
            }
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => {
                    debug!(key = %self.key, "stored value loaded");
                    Some(Some(value))
                }
                Err(e) => {
                    warn!(key = %self.key, error = %e, "stored value unreadable, treating as absent");
                    None
                }
            },
            Err(e) => {
                warn!(key = %self.key, error = %e, "storage read failed, treating as absent");
                None
            }
        }
    }

    async fn persist(&self, encoded: Option<String>) {
        let attempts = self.policy.attempts.max(1);

        for attempt in 1..=attempts {
            let result = match &encoded {
                Some(raw) => self.store.set_item(&self.key, raw).await,
                None => self.store.delete_item(&self.key).await,
            };

            match result {
                Ok(()) => {
                    self.counters.completed.fetch_add(1, Ordering::Relaxed);
                    trace!(key = %self.key, attempt, deleted = encoded.is_none(), "write settled");
                    return;
                }
                Err(e) if attempt < attempts => {
                    debug!(key = %self.key, attempt, error = %e, "write failed, retrying");
                    tokio::time::sleep(self.policy.backoff).await;
                }
                Err(e) => {
                    warn!(
                        key = %self.key,
                        attempts,
                        error = %e,
                        "write failed, stored value may diverge from memory"
                    );
                    self.counters.failed.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
    }
}
