use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};
use tracing::{info, warn};

use super::{load_note, parse_id};
use crate::db::{push_task, update_task, TaskPatch};
use crate::error::AppError;
use crate::middleware::AuthenticatedUser;
use crate::models::requests::{TaskRequest, TaskUpdateRequest};
use crate::models::{Note, NoteKind, Task};
use crate::permission::Access;
use crate::validation::Valid;
use crate::AppState;

fn ensure_todo(note: &Note) -> Result<(), AppError> {
    if note.kind() == NoteKind::Todo {
        Ok(())
    } else {
        Err(AppError::BadRequest("Note is not a todo note"))
    }
}

pub async fn create_task(
    auth: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Valid(req): Valid<TaskRequest>,
) -> Result<Json<Value>, AppError> {
    let note = load_note(&state, &id, &auth.user_id, Access::Write)?;
    ensure_todo(&note)?;

    let task = Task::new(req.content);
    if !push_task(&state.db, &note.id, &task)? {
        return Err(AppError::NotFound);
    }
    info!(user_id = %auth.user_id, note_id = %note.id, task_id = %task.id, "Added task");
    Ok(Json(json!({ "task_id": task.id })))
}

/// Change a task's content, its completion, or both.
pub async fn update_task_fields(
    auth: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Valid(req): Valid<TaskUpdateRequest>,
) -> Result<Json<Note>, AppError> {
    let patch = TaskPatch {
        content: req.content,
        is_completed: req.is_completed,
    };
    if patch.is_empty() {
        warn!(user_id = %auth.user_id, "Nothing to update");
        return Err(AppError::BadRequest("Nothing to update"));
    }

    let note = load_note(&state, &id, &auth.user_id, Access::Write)?;
    ensure_todo(&note)?;

    let task_id = parse_id(&req.task_id)?;
    if !update_task(&state.db, &note.id, &task_id, &patch)? {
        return Err(AppError::NotFound);
    }
    info!(user_id = %auth.user_id, note_id = %note.id, %task_id, "Updated task");

    let note = load_note(&state, &id, &auth.user_id, Access::Read)?;
    Ok(Json(note))
}
