use std::sync::Arc;

use axum::{
    http::StatusCode,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub mod cache;
pub mod clicks;
pub mod codegen;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;

use cache::LinkCache;
use clicks::ClickRecorder;

// ── Shared application state ───────────────────────────────────────────────

pub struct AppState {
    pub db: sqlx::SqlitePool,
    pub cache: LinkCache,
    pub clicks: ClickRecorder,
}

// ── Router ─────────────────────────────────────────────────────────────────

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(|| async { StatusCode::OK }))
        .route("/shorten", post(handlers::shorten::shorten))
        .route("/analytics/:code", get(handlers::analytics::analytics))
        .route("/s/:code", get(handlers::redirect::redirect))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
