mod error;
mod handlers;

use crate::error::{ContentError, Result};
use crate::generation::UpstreamClient;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Shared handler state. Holds no per-request data.
#[derive(Clone)]
pub struct AppState {
    client: Arc<dyn UpstreamClient>,
}

impl AppState {
    pub fn new(client: Arc<dyn UpstreamClient>) -> Self {
        Self { client }
    }
}

/// Creates the API router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/find-topics", post(handlers::find_topics))
        .route("/api/generate", post(handlers::generate))
        .route("/api/optimize-script", post(handlers::optimize_script))
        .with_state(state)
}

/// Bind `address` and serve until Ctrl-C
pub async fn serve(address: &str, state: AppState) -> Result<()> {
    let listener = TcpListener::bind(address)
        .await
        .map_err(|e| ContentError::Server(format!("Failed to bind {}: {}", address, e)))?;
    serve_on(listener, state, shutdown_signal()).await
}

async fn serve_on(
    listener: TcpListener,
    state: AppState,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let local = listener.local_addr()?;
    info!(address = %local, "Listening");

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| ContentError::Server(e.to_string()))
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutting down");
    }
}
