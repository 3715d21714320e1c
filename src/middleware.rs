use axum::extract::FromRequestParts;
use axum::http::{header::AUTHORIZATION, request::Parts, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::{error, warn};

use crate::auth::verify_token;
use crate::error::AppError;
use crate::models::ObjectId;
use crate::AppState;

/// The caller behind a verified bearer token, handed to every protected
/// handler.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser {
    pub user_id: ObjectId,
    pub token_id: ObjectId,
}

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(presented) = bearer_token(parts) else {
            warn!("Missing bearer token");
            return Err(AuthError::Unauthorized);
        };

        match verify_token(&state.db, presented)? {
            Some(token) => Ok(AuthenticatedUser {
                user_id: token.user_id,
                token_id: token.id,
            }),
            None => {
                warn!("Unauthorized API access attempt");
                Err(AuthError::Unauthorized)
            }
        }
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Authentication never says why a token was rejected.
pub enum AuthError {
    Unauthorized,
    Internal,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            AuthError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Unauthorized" })),
            )
                .into_response(),
            AuthError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "We encountered an error while processing your request." })),
            )
                .into_response(),
        }
    }
}

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::Database(cause) | AppError::Internal(cause) => {
                error!(%cause, "Token lookup failed");
                AuthError::Internal
            }
            _ => AuthError::Unauthorized,
        }
    }
}
