use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::NaiveDate;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("invalid date: {0}")]
    InvalidDate(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("invalid phone: {0}")]
    InvalidPhone(String),

    #[error("invalid email: {0}")]
    InvalidEmail(String),

    #[error("date {0} is already reserved")]
    DateConflict(NaiveDate),

    #[error("unauthorized")]
    Unauthorized,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::InvalidDate(_)
            | AppError::InvalidAmount(_)
            | AppError::InvalidPhone(_)
            | AppError::InvalidEmail(_) => StatusCode::BAD_REQUEST,
            AppError::DateConflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidTransition(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Storage faults stay opaque to callers; the detail goes to the log.
        let message = match &self {
            AppError::Database(e) => {
                tracing::error!(error = %e, "database error");
                "internal error".to_string()
            }
            other => other.to_string(),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}
