//! Web API admin tests.

mod common;

use axum::http::header::AUTHORIZATION;
use axum::http::StatusCode;
use serde_json::{json, Value};

use common::{
    login_token, register_token, spawn_app, upload_file, ADMIN_EMAIL, ADMIN_PASSWORD,
};

async fn admin_token(app: &common::TestApp) -> String {
    login_token(&app.server, ADMIN_EMAIL, ADMIN_PASSWORD).await
}

// ============================================================================
// Gating
// ============================================================================

#[tokio::test]
async fn test_admin_endpoints_reject_non_admins() {
    let app = spawn_app().await;
    let token = register_token(&app.server, "alice@example.com", "password123", "Alice").await;

    for path in ["/admin/users", "/admin/uploads", "/admin/stats"] {
        let response = app
            .server
            .get(path)
            .add_header(AUTHORIZATION, format!("Bearer {}", token))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);
    }
}

#[tokio::test]
async fn test_admin_endpoints_reject_anonymous() {
    let app = spawn_app().await;

    let response = app.server.get("/admin/stats").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

// ============================================================================
// User management
// ============================================================================

#[tokio::test]
async fn test_list_users_paginated() {
    let app = spawn_app().await;
    let admin = admin_token(&app).await;

    for i in 0..5 {
        register_token(
            &app.server,
            &format!("user{}@example.com", i),
            "password123",
            &format!("User {}", i),
        )
        .await;
    }

    let response = app
        .server
        .get("/admin/users")
        .add_query_param("page", "1")
        .add_query_param("per_page", "2")
        .add_header(AUTHORIZATION, format!("Bearer {}", admin))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["users"].as_array().unwrap().len(), 2);
    // 5 registered plus the seeded admin
    assert_eq!(body["data"]["pagination"]["total"], 6);
    assert_eq!(body["data"]["pagination"]["pages"], 3);
    assert_eq!(body["data"]["pagination"]["per_page"], 2);
}

#[tokio::test]
async fn test_list_users_clamps_per_page() {
    let app = spawn_app().await;
    let admin = admin_token(&app).await;

    let response = app
        .server
        .get("/admin/users")
        .add_query_param("page", "0")
        .add_query_param("per_page", "9999")
        .add_header(AUTHORIZATION, format!("Bearer {}", admin))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["pagination"]["page"], 1);
    assert_eq!(body["data"]["pagination"]["per_page"], 100);
}

#[tokio::test]
async fn test_admin_creates_user_despite_closed_registration() {
    let app = common::spawn_app_with(|c| c.app.open_registration = false).await;
    let admin = admin_token(&app).await;

    let response = app
        .server
        .post("/admin/users")
        .add_header(AUTHORIZATION, format!("Bearer {}", admin))
        .json(&json!({
            "email": "carol@example.com",
            "password": "password123",
            "name": "Carol",
            "is_admin": true
        }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["data"]["email"], "carol@example.com");
    assert_eq!(body["data"]["is_admin"], true);

    // The new admin can actually log in
    login_token(&app.server, "carol@example.com", "password123").await;
}

#[tokio::test]
async fn test_update_user() {
    let app = spawn_app().await;
    let admin = admin_token(&app).await;

    let body = app
        .server
        .post("/admin/users")
        .add_header(AUTHORIZATION, format!("Bearer {}", admin))
        .json(&json!({
            "email": "dave@example.com",
            "password": "password123",
            "name": "Dave"
        }))
        .await
        .json::<Value>();
    let user_id = body["data"]["id"].as_str().unwrap().to_string();

    let response = app
        .server
        .put(&format!("/admin/users/{}", user_id))
        .add_header(AUTHORIZATION, format!("Bearer {}", admin))
        .json(&json!({
            "name": "David",
            "is_admin": true
        }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["name"], "David");
    assert_eq!(body["data"]["is_admin"], true);
    assert_eq!(body["data"]["email"], "dave@example.com");
}

#[tokio::test]
async fn test_update_user_rejects_taken_email() {
    let app = spawn_app().await;
    let admin = admin_token(&app).await;

    register_token(&app.server, "alice@example.com", "password123", "Alice").await;
    let body = common::register_user(&app.server, "bob@example.com", "password123", "Bob").await;
    let bob_id = body["data"]["user"]["id"].as_str().unwrap().to_string();

    let response = app
        .server
        .put(&format!("/admin/users/{}", bob_id))
        .add_header(AUTHORIZATION, format!("Bearer {}", admin))
        .json(&json!({ "email": "alice@example.com" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_cannot_delete_self() {
    let app = spawn_app().await;
    let admin = admin_token(&app).await;

    let me = app
        .server
        .get("/auth/me")
        .add_header(AUTHORIZATION, format!("Bearer {}", admin))
        .await
        .json::<Value>();
    let admin_id = me["data"]["id"].as_str().unwrap().to_string();

    let response = app
        .server
        .delete(&format!("/admin/users/{}", admin_id))
        .add_header(AUTHORIZATION, format!("Bearer {}", admin))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_user_removes_their_uploads() {
    let app = spawn_app().await;
    let admin = admin_token(&app).await;

    let alice = register_token(&app.server, "alice@example.com", "password123", "Alice").await;
    upload_file(&app.server, &alice, "a.txt", b"data", &[]).await;

    let me = app
        .server
        .get("/auth/me")
        .add_header(AUTHORIZATION, format!("Bearer {}", alice))
        .await
        .json::<Value>();
    let alice_id = me["data"]["id"].as_str().unwrap().to_string();

    let response = app
        .server
        .delete(&format!("/admin/users/{}", alice_id))
        .add_header(AUTHORIZATION, format!("Bearer {}", admin))
        .await;
    response.assert_status_ok();

    // User and upload rows are both gone
    let users: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE id = ?")
        .bind(&alice_id)
        .fetch_one(app.db.pool())
        .await
        .unwrap();
    assert_eq!(users.0, 0);

    let uploads: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM uploads WHERE uploader_id = ?")
        .bind(&alice_id)
        .fetch_one(app.db.pool())
        .await
        .unwrap();
    assert_eq!(uploads.0, 0);
}

#[tokio::test]
async fn test_delete_missing_user_is_not_found() {
    let app = spawn_app().await;
    let admin = admin_token(&app).await;

    let response = app
        .server
        .delete("/admin/users/no-such-id")
        .add_header(AUTHORIZATION, format!("Bearer {}", admin))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
}

// ============================================================================
// Uploads and stats
// ============================================================================

#[tokio::test]
async fn test_admin_uploads_include_inactive_rows() {
    let app = spawn_app().await;
    let admin = admin_token(&app).await;

    let alice = register_token(&app.server, "alice@example.com", "password123", "Alice").await;
    let kept = upload_file(&app.server, &alice, "kept.txt", b"keep", &[]).await;
    let dropped = upload_file(&app.server, &alice, "dropped.txt", b"drop", &[]).await;

    app.server
        .delete(&format!("/upload/{}", dropped["data"]["id"].as_str().unwrap()))
        .add_header(AUTHORIZATION, format!("Bearer {}", alice))
        .await
        .assert_status_ok();

    let response = app
        .server
        .get("/admin/uploads")
        .add_header(AUTHORIZATION, format!("Bearer {}", admin))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    let uploads = body["data"]["uploads"].as_array().unwrap();
    assert_eq!(uploads.len(), 2);
    assert_eq!(body["data"]["pagination"]["total"], 2);
    assert!(uploads.iter().any(|u| u["is_active"] == false));
    assert!(uploads
        .iter()
        .all(|u| u["uploader"]["email"] == "alice@example.com"));

    // kept upload still active
    assert!(uploads
        .iter()
        .any(|u| u["id"] == kept["data"]["id"] && u["is_active"] == true));
}

#[tokio::test]
async fn test_stats_count_active_sizes_only() {
    let app = spawn_app().await;
    let admin = admin_token(&app).await;

    let alice = register_token(&app.server, "alice@example.com", "password123", "Alice").await;
    upload_file(&app.server, &alice, "a.txt", b"12345", &[]).await;
    let dropped = upload_file(&app.server, &alice, "b.txt", b"1234567890", &[]).await;

    app.server
        .delete(&format!("/upload/{}", dropped["data"]["id"].as_str().unwrap()))
        .add_header(AUTHORIZATION, format!("Bearer {}", alice))
        .await
        .assert_status_ok();

    let response = app
        .server
        .get("/admin/stats")
        .add_header(AUTHORIZATION, format!("Bearer {}", admin))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    // Alice plus the seeded admin
    assert_eq!(body["data"]["total_users"], 2);
    assert_eq!(body["data"]["total_uploads"], 2);
    assert_eq!(body["data"]["active_uploads"], 1);
    assert_eq!(body["data"]["total_size"], 5);
}
