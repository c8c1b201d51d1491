//! Quotesync Server binary.

use quotesync_engine::Store;
use quotesync_server::config::Config;
use quotesync_server::persistence::{JsonFilePersistence, SyncMetaFile};
use quotesync_server::remote::HttpFetcher;
use quotesync_server::scheduler::SyncMeta;
use quotesync_server::{app, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quotesync_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    tracing::info!("Starting Quotesync Server on {}:{}", config.host, config.port);

    // Open the local collection
    let persistence = JsonFilePersistence::new(&config.quotes_path);
    let store = Store::open(persistence)?;
    tracing::info!(
        path = %config.quotes_path.display(),
        quotes = store.len(),
        "Loaded quotes"
    );

    let fetcher = HttpFetcher::new(&config.remote_endpoint, config.remote_timeout)?;
    tracing::info!(endpoint = fetcher.endpoint(), "Remote source configured");

    let meta = SyncMetaFile::beside(&config.quotes_path);
    let last_sync = meta.load_last_sync();
    tracing::info!(
        path = %meta.path().display(),
        last_sync = ?last_sync,
        "Loaded sync metadata"
    );

    // Build application state
    let auto_sync = config.auto_sync;
    let state =
        AppState::with_sync_meta(store, Arc::new(fetcher), Arc::new(meta), config.clone());
    if auto_sync {
        state.scheduler.enable_auto_sync();
    }

    // Start server
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app(state)).await?;

    Ok(())
}
