use std::sync::Arc;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::{codegen, error::AppError, AppState};

#[derive(Debug, Deserialize)]
pub struct ShortenRequest {
    pub url: String,
    pub alias: Option<String>,
}

/// The body carries the bare code; the page builds `/s/<code>` itself.
#[derive(Debug, Serialize)]
pub struct ShortenResponse {
    pub short_url: String,
}

/// POST /shorten
pub async fn shorten(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ShortenRequest>,
) -> Result<Json<ShortenResponse>, AppError> {
    let link = codegen::create_link(&state.db, &req.url, req.alias.as_deref()).await?;

    // Write through so the first visit skips the database.
    state.cache.set(&link.code, &link.long_url);
    tracing::info!("created '{}' -> {}", link.code, link.long_url);

    Ok(Json(ShortenResponse {
        short_url: link.code,
    }))
}
