//! Error types for session-ctx.

use thiserror::Error;

use crate::auth::ValidationError;
use crate::config::ConfigError;

/// Main error type for session-ctx operations.
#[derive(Error, Debug)]
pub enum SessionCtxError {
    /// The key-value store rejected an operation.
    #[error("storage error: {0}")]
    Storage(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored or received document was not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Form input failed client-side validation.
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// The auth API refused the request.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// HTTP client error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration could not be applied.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Convenience Result type for session-ctx operations.
pub type Result<T> = std::result::Result<T, SessionCtxError>;

impl From<ConfigError> for SessionCtxError {
    fn from(e: ConfigError) -> Self {
        SessionCtxError::Config(e.to_string())
    }
}
