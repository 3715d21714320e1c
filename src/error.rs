use axum::response::{IntoResponse, Response};
use axum::{http::StatusCode, Json};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::validation::FieldErrors;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("request not valid")]
    Validation(FieldErrors),
    #[error("{0}")]
    BadRequest(&'static str),
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("forbidden")]
    Forbidden,
    #[error("not found")]
    NotFound,
    #[error("{0}")]
    Conflict(&'static str),
    #[error("database error: {0}")]
    Database(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Validation(errors) => {
                return (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(json!({ "error": "request not valid", "errors": errors })),
                )
                    .into_response();
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "Can't login"),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden"),
            AppError::NotFound => (StatusCode::NOT_FOUND, "Not found"),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Database(cause) | AppError::Internal(cause) => {
                error!(%cause, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "We encountered an error while processing your request.",
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}
