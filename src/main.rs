use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sharebox::config::Config;
use sharebox::db::Database;
use sharebox::notify::Mailer;
use sharebox::services::AuthService;
use sharebox::storage::LocalStorage;
use sharebox::{create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sharebox=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting sharebox...");

    // Load configuration
    let config = Config::load()?;
    let config = Arc::new(config);
    tracing::info!("Configuration loaded");

    // Initialize database
    let db = Database::new(&config.database.path).await?;
    db.run_migrations().await?;
    tracing::info!("Database initialized");

    // Make sure an administrator can always log in on a fresh install
    AuthService::ensure_default_admin(&db).await?;

    // Initialize blob storage and mailer
    let storage = Arc::new(LocalStorage::new(&config.storage.upload_dir));
    let mailer = Arc::new(Mailer::new(&config));

    let state = AppState {
        db,
        config: config.clone(),
        storage,
        mailer,
    };

    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
