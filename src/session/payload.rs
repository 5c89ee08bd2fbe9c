//! Session payload.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Opaque authenticated-identity payload.
///
/// Whatever the auth API returned on login is kept whole. The session core
/// never interprets it; [`Session::token`] is a read-only convenience for
/// callers that need the bearer token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Session(Value);

impl Session {
    /// Wrap a payload.
    pub fn new(payload: impl Into<Value>) -> Self {
        Self(payload.into())
    }

    /// Borrow the raw payload.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Unwrap the raw payload.
    pub fn into_value(self) -> Value {
        self.0
    }

    /// Top-level `token` field, if the payload carries one.
    pub fn token(&self) -> Option<&str> {
        self.0.get("token").and_then(Value::as_str)
    }
}

impl From<Value> for Session {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
