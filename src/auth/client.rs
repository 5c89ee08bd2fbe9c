//! Auth API client.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::{LoginRequest, RegisterRequest};
use crate::error::SessionCtxError;
use crate::session::Session;
use crate::Result;

/// Message reported when the API cannot be reached at all.
pub const CONNECTION_ERROR: &str = "connection error";

/// Remote authentication collaborator.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Exchange credentials for a session payload.
    async fn login(&self, request: &LoginRequest) -> Result<Session>;

    /// Create an account. Returns the server's response body.
    async fn register(&self, request: &RegisterRequest) -> Result<Value>;
}

/// [`AuthApi`] over HTTP + JSON.
///
/// Endpoints live under `{api_url}/auth/docente`.
#[derive(Debug, Clone)]
pub struct HttpAuthApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpAuthApi {
    /// Create a client for the API at `api_url`.
    pub fn new(api_url: &str, timeout: Duration) -> Result<Self> {
        let api_url = api_url.trim().trim_end_matches('/');
        if api_url.is_empty() {
            return Err(SessionCtxError::Config("auth API URL is empty".into()));
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: format!("{}/auth/docente", api_url),
        })
    }

    /// Full URL of an endpoint.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn post<B: Serialize + ?Sized + Sync>(&self, path: &str, body: &B) -> Result<Value> {
        let url = self.endpoint(path);
        debug!(%url, "auth request");

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                warn!(%url, error = %e, "auth API unreachable");
                SessionCtxError::Auth(CONNECTION_ERROR.into())
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            warn!(%url, error = %e, "auth response body lost");
            SessionCtxError::Auth(CONNECTION_ERROR.into())
        })?;
        let body: Value = serde_json::from_str(&text).unwrap_or(Value::Null);

        if status.is_success() {
            return Ok(body);
        }

        let message = body
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("request failed with status {}", status.as_u16()));
        debug!(%url, status = status.as_u16(), %message, "auth request rejected");
        Err(SessionCtxError::Auth(message))
    }
}

#[async_trait]
impl AuthApi for HttpAuthApi {
    async fn login(&self, request: &LoginRequest) -> Result<Session> {
        let body = self.post("login", request).await?;
        if body.is_null() {
            return Err(SessionCtxError::Auth("empty login response".into()));
        }
        Ok(Session::new(body))
    }

    async fn register(&self, request: &RegisterRequest) -> Result<Value> {
        self.post("register", request).await
    }
}
