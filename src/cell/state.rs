//! Observable cell state and persistence policy.

use std::time::Duration;

/// Snapshot of a persistent cell.
#[derive(Debug, Clone, PartialEq)]
pub struct CellState<T> {
    /// True until the initial storage read has settled.
    pub is_loading: bool,
    /// Current in-memory value. Not authoritative while `is_loading`.
    pub value: Option<T>,
    /// The initial read failed and the cell fell back to an empty value.
    pub load_failed: bool,
}

impl<T> CellState<T> {
    /// State of a freshly opened cell.
    pub fn loading() -> Self {
        Self {
            is_loading: true,
            value: None,
            load_failed: false,
        }
    }

    /// Loaded state holding `value`.
    pub fn loaded(value: Option<T>) -> Self {
        Self {
            is_loading: false,
            value,
            load_failed: false,
        }
    }

    /// Check if the cell holds a value.
    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }
}

impl<T> Default for CellState<T> {
    fn default() -> Self {
        Self::loading()
    }
}

/// Retry behaviour for background writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WritePolicy {
    /// Total attempts per write, including the first one.
    pub attempts: u32,
    /// Delay between attempts.
    pub backoff: Duration,
}

impl WritePolicy {
    /// Single attempt, no retry.
    pub fn no_retry() -> Self {
        Self {
            attempts: 1,
            backoff: Duration::ZERO,
        }
    }

    /// Set the number of attempts (at least one).
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    /// Set the delay between attempts.
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }
}

impl Default for WritePolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff: Duration::from_millis(50),
        }
    }
}
