//! REST API layer built on Axum.
//!
//! Exposes the vector store to collaborators over HTTP: single and batch
//! inserts, search, fetch, delete, purge and stats.

/// API error type mapped to HTTP status codes.
pub mod errors;
/// HTTP request handlers and application state.
pub mod handlers;
/// Request and response data transfer objects.
pub mod models;

use crate::config::Config;
use crate::embeddings::VectorStore;
use crate::error::Result;
use axum::routing::{get, post};
use axum::Router;
use handlers::AppState;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Build the application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/api/vectors",
            post(handlers::store_vector).delete(handlers::clear_vectors),
        )
        .route("/api/vectors/batch", post(handlers::batch_store))
        .route("/api/vectors/search", post(handlers::search))
        .route(
            "/api/vectors/:id",
            get(handlers::get_vector).delete(handlers::delete_vector),
        )
        .route("/api/stats", get(handlers::stats))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the API until Ctrl+C
pub async fn run(config: &Config, store: Arc<VectorStore>) -> Result<()> {
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("RAG service listening on {}", listener.local_addr()?);

    let app = create_router(AppState::new(store));
    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_signal())
        .await?;

    tracing::info!("RAG service stopped");
    Ok(())
}

async fn wait_for_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Received SIGINT, shutting down");
}
