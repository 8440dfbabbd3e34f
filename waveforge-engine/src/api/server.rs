//! HTTP server setup and routing

use crate::config::Config;
use crate::error::{Error, Result};
use crate::service::EngineService;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

/// Shared application context passed to all handlers
#[derive(Clone)]
pub struct AppContext {
    pub service: Arc<EngineService>,
}

/// Run the HTTP API server until shutdown.
pub async fn start(config: &Config, service: Arc<EngineService>) -> Result<()> {
    let ctx = AppContext { service };

    let app = Router::new()
        .route("/health", get(super::handlers::health))
        .route("/status", get(super::handlers::status))
        .route("/edl", post(super::handlers::update_edl))
        .route("/edl/render", post(super::handlers::render_edl_window))
        .route("/file/load", post(super::handlers::load_file))
        .route("/file/render", post(super::handlers::render_file))
        .route("/events", get(super::sse::event_stream))
        .with_state(ctx)
        .layer(CorsLayer::permissive());

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| Error::Http(format!("Failed to bind to {}: {}", bind_addr, e)))?;

    info!("HTTP server listening on {}", bind_addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| Error::Http(format!("Server error: {}", e)))?;

    Ok(())
}
