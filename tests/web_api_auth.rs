//! Web API authentication tests.

mod common;

use axum::http::header::AUTHORIZATION;
use axum::http::StatusCode;
use serde_json::{json, Value};

use common::{login_token, register_user, spawn_app, spawn_app_with, ADMIN_EMAIL, ADMIN_PASSWORD};

// ============================================================================
// Registration
// ============================================================================

#[tokio::test]
async fn test_register_success() {
    let app = spawn_app().await;

    let response = app
        .server
        .post("/auth/register")
        .json(&json!({
            "email": "alice@example.com",
            "password": "password123",
            "name": "Alice"
        }))
        .await;

    response.assert_status(StatusCode::CREATED);

    let body: Value = response.json();
    assert!(body["data"]["access_token"].is_string());
    assert_eq!(body["data"]["user"]["email"], "alice@example.com");
    assert_eq!(body["data"]["user"]["name"], "Alice");
    assert_eq!(body["data"]["user"]["is_admin"], false);
}

#[tokio::test]
async fn test_register_duplicate_normalized_email() {
    let app = spawn_app().await;

    register_user(&app.server, "alice@example.com", "password123", "Alice").await;

    // Same address, different case and whitespace
    let response = app
        .server
        .post("/auth/register")
        .json(&json!({
            "email": "  Alice@Example.COM ",
            "password": "password456",
            "name": "Alice Again"
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_short_password() {
    let app = spawn_app().await;

    let response = app
        .server
        .post("/auth/register")
        .json(&json!({
            "email": "bob@example.com",
            "password": "short",
            "name": "Bob"
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_invalid_email() {
    let app = spawn_app().await;

    let response = app
        .server
        .post("/auth/register")
        .json(&json!({
            "email": "not-an-email",
            "password": "password123",
            "name": "Bob"
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_disabled() {
    let app = spawn_app_with(|c| c.app.open_registration = false).await;

    let response = app
        .server
        .post("/auth/register")
        .json(&json!({
            "email": "alice@example.com",
            "password": "password123",
            "name": "Alice"
        }))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_registration_status_reflects_config() {
    let app = spawn_app().await;
    let body: Value = app.server.get("/auth/registration-status").await.json();
    assert_eq!(body["data"]["registration_enabled"], true);

    let app = spawn_app_with(|c| c.app.open_registration = false).await;
    let body: Value = app.server.get("/auth/registration-status").await.json();
    assert_eq!(body["data"]["registration_enabled"], false);
}

// ============================================================================
// Login
// ============================================================================

#[tokio::test]
async fn test_login_success() {
    let app = spawn_app().await;

    register_user(&app.server, "alice@example.com", "password123", "Alice").await;

    let response = app
        .server
        .post("/auth/login")
        .json(&json!({
            "email": "alice@example.com",
            "password": "password123"
        }))
        .await;

    response.assert_status_ok();

    let body: Value = response.json();
    assert!(body["data"]["access_token"].is_string());
    assert_eq!(body["data"]["token_type"], "Bearer");
    assert_eq!(body["data"]["user"]["email"], "alice@example.com");
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let app = spawn_app().await;

    register_user(&app.server, "alice@example.com", "password123", "Alice").await;

    // Wrong password for an existing account
    let wrong_password = app
        .server
        .post("/auth/login")
        .json(&json!({
            "email": "alice@example.com",
            "password": "wrongpassword"
        }))
        .await;

    // Account that does not exist at all
    let no_such_user = app
        .server
        .post("/auth/login")
        .json(&json!({
            "email": "nobody@example.com",
            "password": "password123"
        }))
        .await;

    wrong_password.assert_status(StatusCode::UNAUTHORIZED);
    no_such_user.assert_status(StatusCode::UNAUTHORIZED);

    // Identical bodies, so the response cannot be used to enumerate accounts
    assert_eq!(
        wrong_password.json::<Value>()["message"],
        no_such_user.json::<Value>()["message"]
    );
}

#[tokio::test]
async fn test_default_admin_seeded_on_fresh_database() {
    let app = spawn_app().await;

    let response = app
        .server
        .post("/auth/login")
        .json(&json!({
            "email": ADMIN_EMAIL,
            "password": ADMIN_PASSWORD
        }))
        .await;

    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["data"]["user"]["is_admin"], true);
}

// ============================================================================
// Current user
// ============================================================================

#[tokio::test]
async fn test_me_success() {
    let app = spawn_app().await;

    register_user(&app.server, "alice@example.com", "password123", "Alice").await;
    let token = login_token(&app.server, "alice@example.com", "password123").await;

    let response = app
        .server
        .get("/auth/me")
        .add_header(AUTHORIZATION, format!("Bearer {}", token))
        .await;

    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["data"]["email"], "alice@example.com");
    assert_eq!(body["data"]["name"], "Alice");
}

#[tokio::test]
async fn test_me_without_token() {
    let app = spawn_app().await;

    let response = app.server.get("/auth/me").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me_with_garbage_token() {
    let app = spawn_app().await;

    let response = app
        .server
        .get("/auth/me")
        .add_header(AUTHORIZATION, "Bearer not-a-jwt")
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health() {
    let app = spawn_app().await;

    let response = app.server.get("/health").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["data"]["status"], "OK");
}
