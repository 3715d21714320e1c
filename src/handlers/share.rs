use axum::extract::State;
use axum::{http::StatusCode, Json};
use serde_json::{json, Value};
use tracing::{info, warn};

use super::{load_note, parse_id};
use crate::db::{add_share, find_user_by_id, list_shared_with};
use crate::error::AppError;
use crate::middleware::AuthenticatedUser;
use crate::models::requests::ShareRequest;
use crate::models::{ObjectId, Permission, Share, SharedNote};
use crate::permission::Access;
use crate::validation::Valid;
use crate::AppState;

/// Grant another user read or write access to one of the caller's notes.
pub async fn share_note(
    auth: AuthenticatedUser,
    State(state): State<AppState>,
    Valid(req): Valid<ShareRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let target = req.user_id.parse::<ObjectId>().ok();
    if target == Some(auth.user_id) {
        warn!(user_id = %auth.user_id, "Attempt to share a note with oneself");
        return Err(AppError::BadRequest("Can't share the note with yourself."));
    }

    let permission: Permission = req
        .permission
        .parse()
        .map_err(|_| AppError::BadRequest("Unknown permission"))?;

    let note = load_note(&state, &req.note_id, &auth.user_id, Access::Read)?;
    if !note.owned_by(&auth.user_id) {
        warn!(user_id = %auth.user_id, note_id = %note.id, "Only the owner can share a note");
        return Err(AppError::Forbidden);
    }

    let user_id = parse_id(&req.user_id)?;
    if find_user_by_id(&state.db, &user_id)?.is_none() {
        return Err(AppError::NotFound);
    }

    add_share(&state.db, &note.id, &Share { user_id, permission })?;
    info!(
        user_id = %auth.user_id,
        note_id = %note.id,
        shared_with = %user_id,
        permission = permission.as_str(),
        "Shared note"
    );
    Ok((StatusCode::CREATED, Json(json!({ "success": true }))))
}

pub async fn list_shared(
    auth: AuthenticatedUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<SharedNote>>, AppError> {
    let notes = list_shared_with(&state.db, &auth.user_id)?;
    info!(user_id = %auth.user_id, count = notes.len(), "Listed shared notes");
    Ok(Json(notes))
}
