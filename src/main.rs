use std::sync::Arc;
use std::time::Duration;

use tower_http::services::{ServeDir, ServeFile};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vms_site::auth::SharedSecret;
use vms_site::config::Config;
use vms_site::db::Database;
use vms_site::fetcher::Fetcher;
use vms_site::routes::{self, AppState};
use vms_site::upload::ImageStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vms_site=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::var("SITE_CONFIG").unwrap_or_else(|_| "site.toml".to_string());
    let config = Config::load(&config_path)?.apply_env();
    info!("Loaded {} news feeds from {}", config.feeds.len(), config_path);
    if config.admin_secret.is_none() {
        warn!("ADMIN_PASSWORD is not set; article changes will be refused");
    }

    // Initialize database
    let db = Database::new(&config.database_url).await?;
    db.initialize().await?;
    info!("Database initialized");

    tokio::fs::create_dir_all(&config.uploads_dir).await?;

    let state = Arc::new(AppState {
        db: Arc::new(db),
        fetcher: Fetcher::new(
            Duration::from_secs(config.fetch_timeout_secs),
            config.items_per_feed,
        )?,
        images: ImageStore::new(&config.uploads_dir, config.max_upload_bytes),
        authorizer: Arc::new(SharedSecret::new(config.admin_secret.clone())),
        feeds: config.feeds.clone(),
    });

    // Everything outside the API is the single-page front end.
    let index = config.static_dir.join("index.html");
    let app = routes::router(state)
        .fallback_service(ServeDir::new(&config.static_dir).fallback(ServeFile::new(index)));

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    info!("Server starting on http://{}", config.bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
