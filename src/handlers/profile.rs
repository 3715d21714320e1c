use axum::extract::{Multipart, State};
use axum::Json;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::db::{find_user_by_id, update_user_info};
use crate::error::AppError;
use crate::middleware::AuthenticatedUser;
use crate::models::requests::ProfileRequest;
use crate::models::{ProfileResponse, User, UserSummary};
use crate::upload::{remove_stored, ImageUpload, ProfileForm, UploadError};
use crate::validation::decode;
use crate::AppState;

pub async fn get_profile(
    auth: AuthenticatedUser,
    State(state): State<AppState>,
) -> Result<Json<UserSummary>, AppError> {
    match find_user_by_id(&state.db, &auth.user_id)? {
        Some(user) => Ok(Json(user.summary())),
        None => Err(AppError::NotFound),
    }
}

/// Write name and image, then delete whichever image file is no longer
/// referenced. The old file only goes once the row points at the new one.
async fn save_profile(
    state: &AppState,
    user: &User,
    previous: &str,
    stored: Option<&str>,
) -> Result<(), AppError> {
    let result = match update_user_info(&state.db, &user.id, &user.name, &user.image) {
        Ok(true) => Ok(()),
        Ok(false) => Err(AppError::NotFound),
        Err(err) => Err(err),
    };

    match (&result, stored) {
        (Err(_), Some(reference)) => remove_stored(&state.public_dir, reference).await,
        (Ok(()), Some(_)) if !previous.is_empty() => {
            remove_stored(&state.public_dir, previous).await
        }
        _ => {}
    }
    result
}

/// Multipart form with a required `name` and an optional `image` that
/// replaces the current one.
pub async fn update_profile(
    auth: AuthenticatedUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ProfileResponse>, AppError> {
    let form = ProfileForm::read(multipart).await.map_err(|err| {
        warn!(%err, "Unreadable profile form");
        AppError::BadRequest("Malformed form body")
    })?;

    let mut data = Map::new();
    if let Some(name) = &form.name {
        data.insert("name".into(), Value::String(name.trim().to_string()));
    }
    let req: ProfileRequest = decode(&data).map_err(AppError::Validation)?;

    let Some(mut user) = find_user_by_id(&state.db, &auth.user_id)? else {
        return Err(AppError::NotFound);
    };

    let previous = user.image.clone();
    let stored = match ImageUpload::profile()
        .store(&state.public_dir, form.image.as_ref())
        .await
    {
        Ok(reference) => Some(reference),
        Err(UploadError::MissingFile) => None,
        Err(err) => {
            warn!(user_id = %auth.user_id, %err, "Image upload rejected");
            return Err(AppError::BadRequest("Can't upload image"));
        }
    };
    if let Some(reference) = &stored {
        user.image = reference.clone();
    }

    user.name = req.name;
    save_profile(&state, &user, &previous, stored.as_deref()).await?;
    info!(user_id = %user.id, image = %user.image, "Updated profile");

    Ok(Json(ProfileResponse {
        name: user.name,
        image: user.image,
    }))
}
