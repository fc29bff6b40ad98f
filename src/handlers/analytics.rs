use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{db, error::AppError, models::AnalyticsSummary, AppState};

/// GET /analytics/:code
///
/// 404 when the code has no link. A link with zero recorded clicks is not an
/// error: it answers with zero totals and empty breakdowns.
pub async fn analytics(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Json<AnalyticsSummary>, AppError> {
    if db::get_link(&state.db, &code).await?.is_none() {
        return Err(AppError::NotFound);
    }

    let summary = db::summarize_clicks(&state.db, &code).await?;
    Ok(Json(summary))
}
