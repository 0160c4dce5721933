use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{Json, Router, extract::State, routing::get};
use tokio::sync::watch;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::state::{AppState, SharedState, Status};

pub fn router(status: watch::Receiver<Status>) -> Router {
    let state = Arc::new(AppState { status });
    Router::new()
        .route("/status", get(status_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn serve(port: u16, status: watch::Receiver<Status>) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .with_context(|| format!("failed to bind status endpoint on port {port}"))?;
    info!(port, "status endpoint listening");

    axum::serve(listener, router(status))
        .await
        .context("status endpoint stopped")
}

async fn status_handler(State(state): State<SharedState>) -> Json<Status> {
    Json(state.status.borrow().clone())
}
