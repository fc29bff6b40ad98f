use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Everything a request handler can fail with. Each variant maps to the
/// status code and `{"error": "..."}` body the client renders.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("url must be an absolute http or https URL")]
    InvalidUrl,

    #[error("alias must be 3–32 characters: letters, digits, '-' or '_'")]
    InvalidAlias,

    #[error("alias '{0}' is already taken")]
    AliasTaken(String),

    #[error("could not generate a unique short code")]
    GenerationExhausted,

    #[error("short code not found")]
    NotFound,

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidUrl | AppError::InvalidAlias => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::AliasTaken(_) => StatusCode::CONFLICT,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::GenerationExhausted | AppError::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = match &self {
            // Database details stay in the server log, never in the body.
            AppError::Database(e) => {
                tracing::error!("database error: {e:?}");
                "internal error".to_owned()
            }
            other => other.to_string(),
        };

        (self.status(), Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_match_the_taxonomy() {
        assert_eq!(AppError::InvalidUrl.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(AppError::InvalidAlias.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            AppError::AliasTaken("ex1".into()).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(AppError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::GenerationExhausted.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
