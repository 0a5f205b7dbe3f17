//! Test helpers for Web API tests.
//!
//! Builds a TestServer over the real router with a temp-dir backed
//! database and upload directory.

use std::sync::Arc;

use axum::http::header::AUTHORIZATION;
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use serde_json::{json, Value};
use tempfile::TempDir;

use sharebox::config::Config;
use sharebox::db::Database;
use sharebox::notify::Mailer;
use sharebox::services::AuthService;
use sharebox::storage::LocalStorage;
use sharebox::{create_router, AppState};

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "admin123";

/// A running test application; dropping it removes the temp data dir.
pub struct TestApp {
    pub server: TestServer,
    pub db: Database,
    _tmp: TempDir,
}

/// Create a test app with open registration enabled.
pub async fn spawn_app() -> TestApp {
    spawn_app_with(|_| {}).await
}

/// Create a test app with a tweaked configuration.
pub async fn spawn_app_with(tweak: impl FnOnce(&mut Config)) -> TestApp {
    let tmp = TempDir::new().expect("Failed to create temp dir");

    let mut config = Config::default();
    config.database.path = tmp.path().join("test.db").display().to_string();
    config.storage.upload_dir = tmp.path().join("uploads").display().to_string();
    config.jwt.secret = "test-secret-key-for-testing-only".to_string();
    config.app.open_registration = true;
    tweak(&mut config);

    std::fs::create_dir_all(&config.storage.upload_dir).expect("Failed to create upload dir");

    let db = Database::new(&config.database.path)
        .await
        .expect("Failed to open test database");
    db.run_migrations().await.expect("Failed to run migrations");
    AuthService::ensure_default_admin(&db)
        .await
        .expect("Failed to seed default admin");

    let config = Arc::new(config);
    let storage = Arc::new(LocalStorage::new(&config.storage.upload_dir));
    let mailer = Arc::new(Mailer::new(&config));

    let state = AppState {
        db: db.clone(),
        config,
        storage,
        mailer,
    };

    let server = TestServer::new(create_router(state)).expect("Failed to create test server");

    TestApp {
        server,
        db,
        _tmp: tmp,
    }
}

/// Register a user and return the response body.
pub async fn register_user(server: &TestServer, email: &str, password: &str, name: &str) -> Value {
    let response = server
        .post("/auth/register")
        .json(&json!({
            "email": email,
            "password": password,
            "name": name
        }))
        .await;

    response.json::<Value>()
}

/// Login and return the access token.
pub async fn login_token(server: &TestServer, email: &str, password: &str) -> String {
    let response = server
        .post("/auth/login")
        .json(&json!({
            "email": email,
            "password": password
        }))
        .await;

    response.assert_status_ok();
    response.json::<Value>()["data"]["access_token"]
        .as_str()
        .expect("No access token")
        .to_string()
}

/// Register a user and return their access token.
pub async fn register_token(server: &TestServer, email: &str, password: &str, name: &str) -> String {
    let body = register_user(server, email, password, name).await;
    body["data"]["access_token"]
        .as_str()
        .expect("No access token")
        .to_string()
}

/// Upload a file with optional share settings; returns the response body.
pub async fn upload_file(
    server: &TestServer,
    token: &str,
    file_name: &str,
    content: &[u8],
    fields: &[(&str, &str)],
) -> Value {
    let mut form = MultipartForm::new().add_part(
        "file",
        Part::bytes(content.to_vec())
            .file_name(file_name)
            .mime_type("text/plain"),
    );

    for (name, value) in fields {
        form = form.add_text(name.to_string(), value.to_string());
    }

    let response = server
        .post("/upload/")
        .add_header(AUTHORIZATION, format!("Bearer {}", token))
        .multipart(form)
        .await;

    response.assert_status(axum::http::StatusCode::CREATED);
    response.json::<Value>()
}

/// Force a share's expiry into the past, bypassing the API.
pub async fn expire_share(db: &Database, share_token: &str) {
    let past = (chrono::Utc::now() - chrono::Duration::hours(1)).to_rfc3339();
    sqlx::query("UPDATE uploads SET expires_at = ? WHERE share_token = ?")
        .bind(&past)
        .bind(share_token)
        .execute(db.pool())
        .await
        .expect("Failed to expire share");
}
