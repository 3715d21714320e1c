use axum::extract::{Path, Query, State};
use axum::{http::StatusCode, Json};
use serde::Deserialize;
use tracing::info;

use super::{load_note, non_blank, parse_id};
use crate::db::{
    delete_note, insert_note, list_notes, update_note, BodyPatch, NoteFilter, NoteUpdate,
    SortOrder,
};
use crate::error::AppError;
use crate::middleware::AuthenticatedUser;
use crate::models::requests::{
    MovieRequest, MovieUpdateRequest, NoteRequest, NoteUpdateRequest, TextRequest, TodoRequest,
};
use crate::models::{
    MovieNote, Note, NoteBody, NoteKind, NoteSummary, ObjectId, Task, TextNote, TodoNote,
};
use crate::permission::Access;
use crate::validation::Payload;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub sort: Option<String>,
}

impl ListQuery {
    fn into_filter(self, user_id: ObjectId) -> Result<NoteFilter, AppError> {
        let kind = match self.kind.as_deref().map(str::trim) {
            None | Some("") | Some("all") => None,
            Some(kind) => Some(
                kind.parse::<NoteKind>()
                    .map_err(|_| AppError::BadRequest("Unknown note type"))?,
            ),
        };
        let sort = match self.sort.as_deref() {
            Some("asc") => SortOrder::Asc,
            _ => SortOrder::Desc,
        };
        Ok(NoteFilter { user_id, kind, sort })
    }
}

pub async fn list(
    auth: AuthenticatedUser,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<NoteSummary>>, AppError> {
    let filter = query.into_filter(auth.user_id)?;
    let notes = list_notes(&state.db, &filter)?;
    info!(user_id = %auth.user_id, count = notes.len(), "Listed notes");
    Ok(Json(notes))
}

pub async fn get(
    auth: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Note>, AppError> {
    let note = load_note(&state, &id, &auth.user_id, Access::Read)?;
    Ok(Json(note))
}

pub async fn create(
    auth: AuthenticatedUser,
    State(state): State<AppState>,
    payload: Payload,
) -> Result<(StatusCode, Json<Note>), AppError> {
    let base: NoteRequest = payload.decode()?;
    let kind: NoteKind = base
        .kind
        .parse()
        .map_err(|_| AppError::BadRequest("Unknown note type"))?;

    let body = match kind {
        NoteKind::Text => {
            let text: TextRequest = payload.decode()?;
            NoteBody::Text {
                text_note: TextNote { content: text.content },
            }
        }
        NoteKind::Todo => {
            let todo: TodoRequest = payload.decode()?;
            NoteBody::Todo {
                todo_note: TodoNote {
                    tasks: todo.tasks.into_iter().map(Task::new).collect(),
                },
            }
        }
        NoteKind::Movie => {
            let movie: MovieRequest = payload.decode()?;
            NoteBody::Movie {
                movie_note: MovieNote {
                    year: movie.year,
                    watched: movie.watched,
                    director: non_blank(&movie.director),
                },
            }
        }
    };

    let note = Note::new(auth.user_id, base.title, base.tags, body);
    insert_note(&state.db, &note)?;
    info!(user_id = %auth.user_id, note_id = %note.id, kind = %kind, "Created note");
    Ok((StatusCode::CREATED, Json(note)))
}

/// Title, tags and the payload fields of the note's stored type. The type
/// itself never changes and todo tasks are left alone.
pub async fn update(
    auth: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Payload,
) -> Result<Json<Note>, AppError> {
    let note = load_note(&state, &id, &auth.user_id, Access::Write)?;

    let base: NoteUpdateRequest = payload.decode()?;
    let body = match note.kind() {
        NoteKind::Text => {
            let text: TextRequest = payload.decode()?;
            BodyPatch::Text { content: text.content }
        }
        NoteKind::Todo => BodyPatch::Todo,
        NoteKind::Movie => {
            let movie: MovieUpdateRequest = payload.decode()?;
            BodyPatch::Movie {
                year: movie.year,
                director: non_blank(&movie.director),
            }
        }
    };

    let update = NoteUpdate {
        title: base.title,
        tags: base.tags,
        body,
    };
    if !update_note(&state.db, &note.id, &update)? {
        return Err(AppError::NotFound);
    }
    info!(user_id = %auth.user_id, note_id = %note.id, "Updated note");

    let note = load_note(&state, &id, &auth.user_id, Access::Read)?;
    Ok(Json(note))
}

/// Only the owner deletes; shares go with the note.
pub async fn delete(
    auth: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id)?;
    if delete_note(&state.db, &id, &auth.user_id)? {
        info!(user_id = %auth.user_id, note_id = %id, "Deleted note");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound)
    }
}
