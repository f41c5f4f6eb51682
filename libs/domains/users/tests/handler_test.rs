//! Handler tests for the auth endpoints
//!
//! Drive the users router with `oneshot` over in-memory repositories:
//! - Request deserialization and validation
//! - Status codes and response bodies
//! - Token revocation semantics

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use domain_users::*;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt; // For oneshot()

fn app() -> Router {
    let service = AuthService::new(InMemoryUserRepository::new(), InMemoryTokenRepository::new());
    handlers::router(service)
}

async fn send(app: &Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn register(app: &Router, email: &str) -> Value {
    let (status, body) = send(
        app,
        "POST",
        "/register",
        None,
        Some(json!({"name": "Ada Lovelace", "email": email, "password": "password123"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body
}

#[tokio::test]
async fn test_register_returns_201_with_token_triple() {
    let app = app();
    let body = register(&app, "ada@example.com").await;

    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["user"]["email"], "ada@example.com");
    assert_eq!(body["user"]["name"], "Ada Lovelace");
    assert!(body["user"].get("password_hash").is_none());
    assert!(body["token"].as_str().unwrap().contains('|'));
}

#[tokio::test]
async fn test_register_duplicate_email_is_422() {
    let app = app();
    register(&app, "ada@example.com").await;

    let (status, body) = send(
        &app,
        "POST",
        "/register",
        None,
        Some(json!({"name": "Other", "email": "ada@example.com", "password": "password123"})),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"]["email"][0], "The email has already been taken.");
}

#[tokio::test]
async fn test_register_validates_fields() {
    let (status, body) = send(&app(), "POST", "/register", None, Some(json!({"email": "nope"}))).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "VALIDATION_ERROR");
    assert!(body["details"].get("name").is_some());
    assert!(body["details"].get("email").is_some());
    assert!(body["details"].get("password").is_some());
}

#[tokio::test]
async fn test_login_with_bad_credentials_is_422_on_email() {
    let app = app();
    register(&app, "ada@example.com").await;

    let (status, body) = send(
        &app,
        "POST",
        "/login",
        None,
        Some(json!({"email": "ada@example.com", "password": "wrong-password"})),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "The provided credentials are incorrect.");
    assert_eq!(body["details"]["email"][0], "The provided credentials are incorrect.");
}

#[tokio::test]
async fn test_login_returns_fresh_token() {
    let app = app();
    let registered = register(&app, "ada@example.com").await;

    let (status, body) = send(
        &app,
        "POST",
        "/login",
        None,
        Some(json!({"email": "ada@example.com", "password": "password123"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], registered["user"]["id"]);
    assert_ne!(body["token"], registered["token"]);
}

#[tokio::test]
async fn test_me_requires_token() {
    let (status, body) = send(&app(), "GET", "/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Unauthenticated.");
}

#[tokio::test]
async fn test_logout_revokes_only_current_token() {
    let app = app();
    let first = register(&app, "ada@example.com").await;
    let first_token = first["token"].as_str().unwrap().to_string();

    let (_, second) = send(
        &app,
        "POST",
        "/login",
        None,
        Some(json!({"email": "ada@example.com", "password": "password123"})),
    )
    .await;
    let second_token = second["token"].as_str().unwrap().to_string();

    let (status, body) = send(&app, "POST", "/logout", Some(&first_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Logged out successfully");

    let (status, _) = send(&app, "GET", "/me", Some(&first_token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, me) = send(&app, "GET", "/me", Some(&second_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], "ada@example.com");
}
