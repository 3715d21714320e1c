use axum::extract::{Path, State};
use axum::Json;
use tracing::info;

use super::{load_note, non_blank};
use crate::db::{patch_movie, MoviePatch};
use crate::error::AppError;
use crate::middleware::AuthenticatedUser;
use crate::models::requests::MovieRequest;
use crate::models::{Note, NoteKind};
use crate::permission::Access;
use crate::validation::Valid;
use crate::AppState;

pub async fn update_movie(
    auth: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Valid(req): Valid<MovieRequest>,
) -> Result<Json<Note>, AppError> {
    let note = load_note(&state, &id, &auth.user_id, Access::Write)?;
    if note.kind() != NoteKind::Movie {
        return Err(AppError::BadRequest("Note is not a movie note"));
    }

    let patch = MoviePatch {
        year: req.year,
        watched: req.watched,
        director: non_blank(&req.director),
    };
    if !patch_movie(&state.db, &note.id, &patch)? {
        return Err(AppError::NotFound);
    }
    info!(user_id = %auth.user_id, note_id = %note.id, watched = patch.watched, "Updated movie");

    let note = load_note(&state, &id, &auth.user_id, Access::Read)?;
    Ok(Json(note))
}
