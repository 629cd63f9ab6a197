use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use civic_portal_api::config::config;
use civic_portal_api::database::{DatabaseManager, MemoryStore, PgStore, Store};
use civic_portal_api::notify::LogMailer;
use civic_portal_api::server::{serve, AppState};
use civic_portal_api::storage::LocalDiskStorage;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("civic_portal_api=info,tower_http=info")),
        )
        .init();

    let config = config().clone();
    tracing::info!("Starting Civic Portal API in {:?} mode", config.environment);

    if civic_portal_api::is_production!() && config.security.jwt_secret.is_empty() {
        anyhow::bail!("JWT_SECRET must be set in production");
    }

    let store: Arc<dyn Store> = match &config.database.url {
        Some(url) => {
            tracing::info!("Connecting to {}", DatabaseManager::redacted(url));
            let pool = DatabaseManager::connect(&config.database).await?;
            DatabaseManager::migrate(&pool).await?;
            Arc::new(PgStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using the in-memory store, data is lost on exit");
            Arc::new(MemoryStore::new())
        }
    };

    let storage = Arc::new(LocalDiskStorage::new(
        config.storage.upload_dir.clone(),
        config.storage.public_url_prefix.clone(),
    ));

    let state = AppState::new(config, store, Arc::new(LogMailer), storage);
    serve(state).await
}
