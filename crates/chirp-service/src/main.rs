//! Chirp Service - server-rendered micro-blogging site
//!
//! This is the main entry point for the chirp service.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chirp_service::{create_router, AppState, FirebaseVerifier, ServiceConfig};
use chirp_store::{FsBlobStore, Store};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,chirp=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Chirp Service");

    // Load configuration from environment
    let config = ServiceConfig::from_env();

    tracing::info!(
        listen_addr = %config.listen_addr,
        data_dir = %config.data_dir,
        blob_dir = %config.blob_dir,
        firebase_project = %config.firebase_project_id,
        "Service configuration loaded"
    );

    let store = open_store(&config)?;
    let blobs = Arc::new(FsBlobStore::new(&config.blob_dir, &config.media_base_url));
    let verifier = Arc::new(FirebaseVerifier::new(&config));

    // Build app state
    let state = AppState::new(store, blobs, verifier, config.clone());

    // Create the router
    let app = create_router(state);
    tracing::info!("Router configured with all page routes");

    // Start HTTP server
    tracing::info!(listen_addr = %config.listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(feature = "rocksdb-backend")]
fn open_store(config: &ServiceConfig) -> Result<Arc<dyn Store>, Box<dyn std::error::Error>> {
    tracing::info!(path = %config.data_dir, "Opening RocksDB store");
    Ok(Arc::new(chirp_store::RocksStore::open(&config.data_dir)?))
}

#[cfg(not(feature = "rocksdb-backend"))]
fn open_store(_config: &ServiceConfig) -> Result<Arc<dyn Store>, Box<dyn std::error::Error>> {
    tracing::warn!("Built without rocksdb-backend - using in-memory store, data is lost on exit");
    Ok(Arc::new(chirp_store::MemoryStore::new()))
}
