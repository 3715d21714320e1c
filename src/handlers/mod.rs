pub mod auth;
pub mod movies;
pub mod notes;
pub mod profile;
pub mod share;
pub mod todos;

use crate::db::find_note;
use crate::error::AppError;
use crate::models::{Note, ObjectId};
use crate::permission::{authorize, Access};
use crate::AppState;

/// Ids that do not parse cannot name anything that exists.
pub(crate) fn parse_id(raw: &str) -> Result<ObjectId, AppError> {
    raw.parse().map_err(|_| AppError::NotFound)
}

/// Optional free-text fields arrive as `""` when unset.
pub(crate) fn non_blank(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Load a note and check that `user_id` may use it as `access` requires.
pub(crate) fn load_note(
    state: &AppState,
    raw_id: &str,
    user_id: &ObjectId,
    access: Access,
) -> Result<Note, AppError> {
    let id = parse_id(raw_id)?;
    let note = find_note(&state.db, &id)?;
    authorize(note, user_id, access)
}
