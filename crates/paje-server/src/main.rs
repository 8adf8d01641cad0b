mod configuration;
mod error;
mod routes;
mod state;

use std::sync::Arc;

use anyhow::Context;
use paje::document::DocumentStore;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let settings = configuration::Settings::new()?;
    let addr = settings
        .server
        .socket_addr()
        .with_context(|| format!("Invalid server address {}", settings.server.host))?;

    // One document store for the lifetime of the process
    let documents = Arc::new(DocumentStore::new(settings.document.path.clone()));

    // Warm the cache in the background; a failure here is retried on the first search
    let preload = Arc::clone(&documents);
    tokio::spawn(async move {
        if let Err(e) = preload.ensure_loaded().await {
            tracing::warn!(error = %e, "document preload failed");
        }
    });

    // Create app state
    let state = state::AppState::new(&settings, documents)?;

    // Create router with CORS support
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = routes::configure(state).layer(cors);

    // Run server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
