use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use serde_json::{Map, Value};
use tracing::debug;

use super::{decode, Shape};
use crate::error::AppError;

/// The request body as an untyped JSON object.
///
/// A body that is empty, not JSON, or not an object decodes to an empty map;
/// the shape's `required` rules then report what is missing.
pub struct Payload(pub Map<String, Value>);

impl<S> FromRequest<S> for Payload
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|_| AppError::BadRequest("Unreadable request body"))?;

        match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Object(map)) => Ok(Payload(map)),
            Ok(_) | Err(_) => {
                debug!(len = bytes.len(), "Request body is not a JSON object");
                Ok(Payload(Map::new()))
            }
        }
    }
}

impl Payload {
    pub fn decode<T: Shape>(&self) -> Result<T, AppError> {
        decode(&self.0).map_err(AppError::Validation)
    }
}

/// A body that has already passed its shape's rules.
pub struct Valid<T>(pub T);

impl<S, T> FromRequest<S> for Valid<T>
where
    S: Send + Sync,
    T: Shape + Send,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Payload(data) = Payload::from_request(req, state).await?;
        decode(&data).map(Valid).map_err(AppError::Validation)
    }
}
