//! Auth API integration tests.
//!
//! These tests run `HttpAuthApi` against a local axum server standing in for
//! the remote auth API, then feed the result into a file-backed context.

use std::sync::Arc;
use std::time::Duration;

use axum::{http::StatusCode, response::IntoResponse, routing::post, Json, Router};
use serde_json::{json, Value};
use tempfile::TempDir;

use session_ctx::auth::{self, AuthApi, HttpAuthApi, LoginRequest, RegisterForm};
use session_ctx::{AuthState, FileStore, SessionContext, SessionCtxError};

async fn login(Json(body): Json<Value>) -> impl IntoResponse {
    if body["password"] == "boom" {
        return (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response();
    }
    if body["correo"] == "usuario@ejemplo.com" && body["password"] == "password123" {
        return (
            StatusCode::OK,
            Json(json!({"id": 1, "token": "abc", "correo": body["correo"]})),
        )
            .into_response();
    }
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"message": "Credenciales inválidas"})),
    )
        .into_response()
}

async fn register(Json(body): Json<Value>) -> impl IntoResponse {
    if body["correo"] == "taken@escuela.mx" {
        return (
            StatusCode::CONFLICT,
            Json(json!({"message": "El correo ya está registrado"})),
        );
    }
    (StatusCode::CREATED, Json(json!({"correo": body["correo"]})))
}

/// Start the fake API and return its base URL.
async fn spawn_api() -> String {
    let app = Router::new()
        .route("/auth/docente/login", post(login))
        .route("/auth/docente/register", post(register));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

fn client(base: &str) -> HttpAuthApi {
    HttpAuthApi::new(base, Duration::from_secs(5)).unwrap()
}

// ============================================================================
// Login Tests
// ============================================================================

#[tokio::test]
async fn test_login_success_returns_payload() {
    let api = client(&spawn_api().await);

    let session = api
        .login(&LoginRequest::new("Usuario@Ejemplo.com", "password123"))
        .await
        .unwrap();

    assert_eq!(session.token(), Some("abc"));
    assert_eq!(session.as_value()["correo"], "usuario@ejemplo.com");
}

#[tokio::test]
async fn test_login_rejected_uses_server_message() {
    let api = client(&spawn_api().await);

    let err = api
        .login(&LoginRequest::new("usuario@ejemplo.com", "nope"))
        .await
        .unwrap_err();

    match err {
        SessionCtxError::Auth(message) => assert_eq!(message, "Credenciales inválidas"),
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn test_login_non_json_error_reports_status() {
    let api = client(&spawn_api().await);

    let err = api
        .login(&LoginRequest::new("usuario@ejemplo.com", "boom"))
        .await
        .unwrap_err();

    match err {
        SessionCtxError::Auth(message) => assert!(message.contains("500")),
        other => panic!("unexpected error: {}", other),
    }
}

// ============================================================================
// Register Tests
// ============================================================================

#[tokio::test]
async fn test_register_success() {
    let api = client(&spawn_api().await);
    let form = RegisterForm {
        email: "nuevo@escuela.mx".into(),
        password: "pw".into(),
        confirm_password: "pw".into(),
        accepts_terms: true,
    };

    let response = auth::register_with(&api, &form).await.unwrap();
    assert_eq!(response["correo"], "nuevo@escuela.mx");
}

#[tokio::test]
async fn test_register_conflict() {
    let api = client(&spawn_api().await);
    let form = RegisterForm {
        email: "taken@escuela.mx".into(),
        password: "pw".into(),
        confirm_password: "pw".into(),
        accepts_terms: true,
    };

    let err = auth::register_with(&api, &form).await.unwrap_err();
    assert!(err.to_string().contains("ya está registrado"));
}

// ============================================================================
// End-to-end: login, persist, restart
// ============================================================================

#[tokio::test]
async fn test_login_persists_across_restart() {
    let api = client(&spawn_api().await);
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("store.json");

    {
        let ctx = SessionContext::mount(Arc::new(FileStore::new(&path)));
        ctx.loaded().await;

        let request = LoginRequest::new("usuario@ejemplo.com", "password123");
        assert!(auth::sign_in_with(&api, &ctx, &request).await.unwrap());
        ctx.flush().await;
    }

    let ctx = SessionContext::mount(Arc::new(FileStore::new(&path)));
    let snapshot = ctx.loaded().await;
    assert_eq!(snapshot.auth_state(), AuthState::Authenticated);
    assert_eq!(snapshot.session.unwrap().token(), Some("abc"));

    assert!(ctx.sign_out());
    ctx.flush().await;

    let ctx = SessionContext::mount(Arc::new(FileStore::new(&path)));
    assert_eq!(ctx.loaded().await.auth_state(), AuthState::Unauthenticated);
}
