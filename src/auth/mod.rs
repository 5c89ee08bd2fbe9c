//! Authentication collaborator.
//!
//! The login and register screens check their input locally, then call the
//! remote auth API. A successful login yields the opaque [`Session`] payload
//! that is handed to [`SessionContext::sign_in`].
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use session_ctx::auth::{self, HttpAuthApi, LoginRequest};
//! use session_ctx::{MemoryStore, SessionContext};
//!
//! #[tokio::main]
//! async fn main() -> session_ctx::Result<()> {
//!     let ctx = SessionContext::mount(Arc::new(MemoryStore::new()));
//!     let api = HttpAuthApi::new("http://192.168.0.10:3000", Duration::from_secs(10))?;
//!
//!     let request = LoginRequest::new("docente@escuela.mx", "password123");
//!     auth::sign_in_with(&api, &ctx, &request).await?;
//!     Ok(())
//! }
//! ```

mod client;
mod credentials;

pub use client::{AuthApi, HttpAuthApi, CONNECTION_ERROR};
pub use credentials::{LoginRequest, RegisterForm, RegisterRequest, ValidationError};

use serde_json::Value;
use tracing::info;

use crate::session::{AuthState, Session, SessionContext};
use crate::Result;

/// Validate, log in, and install the resulting session.
///
/// Returns `Ok(false)` without contacting the API if a session is already
/// active or the stored session has not been read yet.
pub async fn sign_in_with(
    api: &dyn AuthApi,
    ctx: &SessionContext,
    request: &LoginRequest,
) -> Result<bool> {
    request.validate()?;

    match ctx.state() {
        AuthState::Unauthenticated => {}
        AuthState::Authenticated => {
            info!("already signed in, login skipped");
            return Ok(false);
        }
        AuthState::Unknown => {
            info!("stored session not loaded yet, login skipped");
            return Ok(false);
        }
    }

    let session: Session = api.login(request).await?;
    Ok(ctx.sign_in(session))
}

/// Validate the form and register the account.
pub async fn register_with(api: &dyn AuthApi, form: &RegisterForm) -> Result<Value> {
    let request = form.validate()?;
    let response = api.register(&request).await?;
    info!(email = %request.email, "account registered");
    Ok(response)
}
