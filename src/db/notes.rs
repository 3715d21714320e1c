use rusqlite::{params, Connection, OptionalExtension, Result, Row, ToSql};
use serde_json::{json, Value};

use super::{json_column, lock, DbPool};
use crate::error::AppError;
use crate::models::{now, Note, NoteKind, NoteSummary, ObjectId, Permission, Share, Task};

const SUMMARY_COLUMNS: &str = "id, type, title, tags, user_id, created_at, updated_at";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone)]
pub struct NoteFilter {
    pub user_id: ObjectId,
    pub kind: Option<NoteKind>,
    pub sort: SortOrder,
}

/// The payload fields a generic update may touch, chosen by the stored
/// note's type. Todo tasks are deliberately absent.
#[derive(Debug, Clone)]
pub enum BodyPatch {
    Text { content: String },
    Todo,
    Movie { year: i64, director: Option<String> },
}

impl BodyPatch {
    fn kind(&self) -> NoteKind {
        match self {
            BodyPatch::Text { .. } => NoteKind::Text,
            BodyPatch::Todo => NoteKind::Todo,
            BodyPatch::Movie { .. } => NoteKind::Movie,
        }
    }

    fn fields(&self) -> Vec<(String, Value)> {
        match self {
            BodyPatch::Text { content } => vec![("$.text_note.content".into(), json!(content))],
            BodyPatch::Todo => Vec::new(),
            BodyPatch::Movie { year, director } => vec![
                ("$.movie_note.year".into(), json!(year)),
                ("$.movie_note.director".into(), json!(director)),
            ],
        }
    }
}

#[derive(Debug, Clone)]
pub struct NoteUpdate {
    pub title: String,
    pub tags: Vec<String>,
    pub body: BodyPatch,
}

#[derive(Debug, Clone)]
pub struct MoviePatch {
    pub year: i64,
    pub watched: bool,
    pub director: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub content: Option<String>,
    pub is_completed: Option<bool>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.content.is_none() && self.is_completed.is_none()
    }

    fn fields(&self, index: i64) -> Vec<(String, Value)> {
        let base = format!("$.todo_note.tasks[{index}]");
        let mut fields = Vec::new();
        if let Some(content) = &self.content {
            fields.push((format!("{base}.content"), json!(content)));
        }
        if let Some(is_completed) = self.is_completed {
            fields.push((format!("{base}.is_completed"), json!(is_completed)));
            fields.push((
                format!("{base}.completed_at"),
                json!(Task::completion(is_completed)),
            ));
        }
        fields
    }
}

fn summary_from_row(row: &Row<'_>) -> Result<NoteSummary> {
    let kind: String = row.get(1)?;
    Ok(NoteSummary {
        id: row.get(0)?,
        kind: kind.parse().map_err(|_| {
            rusqlite::Error::FromSqlConversionFailure(
                1,
                rusqlite::types::Type::Text,
                format!("unknown note type {kind:?}").into(),
            )
        })?,
        title: row.get(2)?,
        tags: json_column(row, 3)?,
        user_id: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn note_from_row(row: &Row<'_>) -> Result<Note> {
    Ok(Note {
        id: row.get(0)?,
        title: row.get(1)?,
        tags: json_column(row, 2)?,
        user_id: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
        shared_with: Vec::new(),
        body: json_column(row, 6)?,
    })
}

pub(super) fn shares_of(conn: &Connection, note_id: &ObjectId) -> Result<Vec<Share>> {
    let mut stmt = conn.prepare(
        "SELECT user_id, permission FROM note_shares WHERE note_id = ?1 ORDER BY rowid",
    )?;
    let shares = stmt
        .query_map([note_id], |row| {
            Ok(Share {
                user_id: row.get(0)?,
                permission: permission_column(row, 1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(shares)
}

pub(super) fn permission_column(row: &Row<'_>, idx: usize) -> Result<Permission> {
    let permission: String = row.get(idx)?;
    permission.parse().map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            format!("unknown permission {permission:?}").into(),
        )
    })
}

pub(super) fn summaries(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> Result<Vec<NoteSummary>> {
    let mut stmt = conn.prepare(sql)?;
    let notes = stmt
        .query_map(params, summary_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(notes)
}

/// Apply `json_set` for every `(path, value)` pair on one note, bumping
/// `updated_at`. Returns whether a note of type `kind` matched.
fn set_body_fields(
    conn: &Connection,
    id: &ObjectId,
    kind: NoteKind,
    fields: &[(String, Value)],
) -> Result<bool, AppError> {
    let mut assignments = Vec::new();
    let mut params: Vec<Box<dyn ToSql>> = vec![Box::new(now())];

    for (path, value) in fields {
        params.push(Box::new(path.clone()));
        let path_idx = params.len();
        params.push(Box::new(serde_json::to_string(value)?));
        let value_idx = params.len();
        assignments.push(format!("?{path_idx}, json(?{value_idx})"));
    }

    let body = if assignments.is_empty() {
        "body".to_string()
    } else {
        format!("json_set(body, {})", assignments.join(", "))
    };

    params.push(Box::new(*id));
    let id_idx = params.len();
    params.push(Box::new(kind.as_str()));
    let kind_idx = params.len();

    let query = format!(
        "UPDATE notes SET updated_at = ?1, body = {body} WHERE id = ?{id_idx} AND type = ?{kind_idx}"
    );

    let params_refs: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();
    let rows = conn.execute(&query, params_refs.as_slice())?;
    Ok(rows > 0)
}

pub fn insert_note(pool: &DbPool, note: &Note) -> Result<(), AppError> {
    let tags = serde_json::to_string(&note.tags)?;
    let body = serde_json::to_string(&note.body)?;

    let conn = lock(pool)?;
    conn.execute(
        "INSERT INTO notes (id, user_id, type, title, tags, body, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        (
            &note.id,
            &note.user_id,
            note.kind().as_str(),
            &note.title,
            &tags,
            &body,
            note.created_at,
            note.updated_at,
        ),
    )?;
    Ok(())
}

/// Load a note with its shares, regardless of who owns it.
pub fn find_note(pool: &DbPool, id: &ObjectId) -> Result<Option<Note>, AppError> {
    let conn = lock(pool)?;
    let note = conn
        .query_row(
            "SELECT id, title, tags, user_id, created_at, updated_at, body
             FROM notes WHERE id = ?1",
            [id],
            note_from_row,
        )
        .optional()?;

    match note {
        Some(mut note) => {
            note.shared_with = shares_of(&conn, id)?;
            Ok(Some(note))
        }
        None => Ok(None),
    }
}

pub fn list_notes(pool: &DbPool, filter: &NoteFilter) -> Result<Vec<NoteSummary>, AppError> {
    let conn = lock(pool)?;
    let order = filter.sort.as_sql();

    let notes = match filter.kind {
        Some(kind) => summaries(
            &conn,
            &format!(
                "SELECT {SUMMARY_COLUMNS} FROM notes WHERE user_id = ?1 AND type = ?2
                 ORDER BY created_at {order}, rowid {order}"
            ),
            params![filter.user_id, kind.as_str()],
        )?,
        None => summaries(
            &conn,
            &format!(
                "SELECT {SUMMARY_COLUMNS} FROM notes WHERE user_id = ?1
                 ORDER BY created_at {order}, rowid {order}"
            ),
            params![filter.user_id],
        )?,
    };
    Ok(notes)
}

/// Overwrite title, tags and the type-specific fields of `update.body`.
pub fn update_note(pool: &DbPool, id: &ObjectId, update: &NoteUpdate) -> Result<bool, AppError> {
    let tags = serde_json::to_string(&update.tags)?;

    let mut conn = lock(pool)?;
    let tx = conn.transaction()?;
    let matched = set_body_fields(&tx, id, update.body.kind(), &update.body.fields())?;
    if matched {
        tx.execute(
            "UPDATE notes SET title = ?1, tags = ?2 WHERE id = ?3",
            (&update.title, &tags, id),
        )?;
    }
    tx.commit()?;
    Ok(matched)
}

/// Delete a note. Only its owner matches.
pub fn delete_note(pool: &DbPool, id: &ObjectId, owner: &ObjectId) -> Result<bool, AppError> {
    let conn = lock(pool)?;
    let rows = conn.execute(
        "DELETE FROM notes WHERE id = ?1 AND user_id = ?2",
        [id, owner],
    )?;
    Ok(rows > 0)
}

pub fn patch_movie(pool: &DbPool, id: &ObjectId, patch: &MoviePatch) -> Result<bool, AppError> {
    let conn = lock(pool)?;
    set_body_fields(
        &conn,
        id,
        NoteKind::Movie,
        &[
            ("$.movie_note.year".into(), json!(patch.year)),
            ("$.movie_note.watched".into(), json!(patch.watched)),
            ("$.movie_note.director".into(), json!(patch.director)),
        ],
    )
}

/// Append `task` to a todo note's task list.
pub fn push_task(pool: &DbPool, note_id: &ObjectId, task: &Task) -> Result<bool, AppError> {
    let task = serde_json::to_string(task)?;

    let conn = lock(pool)?;
    let rows = conn.execute(
        "UPDATE notes
         SET body = json_insert(body, '$.todo_note.tasks[#]', json(?1)), updated_at = ?2
         WHERE id = ?3 AND type = 'todo'",
        (&task, now(), note_id),
    )?;
    Ok(rows > 0)
}

/// Patch one task of a todo note by task id. Returns `false` when the note
/// or the task does not exist.
pub fn update_task(
    pool: &DbPool,
    note_id: &ObjectId,
    task_id: &ObjectId,
    patch: &TaskPatch,
) -> Result<bool, AppError> {
    let mut conn = lock(pool)?;
    let tx = conn.transaction()?;

    let index: Option<i64> = tx
        .query_row(
            "SELECT t.key FROM notes, json_each(notes.body, '$.todo_note.tasks') AS t
             WHERE notes.id = ?1 AND notes.type = 'todo'
               AND json_extract(t.value, '$.id') = ?2",
            [note_id, task_id],
            |row| row.get(0),
        )
        .optional()?;

    let Some(index) = index else {
        return Ok(false);
    };

    let matched = set_body_fields(&tx, note_id, NoteKind::Todo, &patch.fields(index))?;
    tx.commit()?;
    Ok(matched)
}
