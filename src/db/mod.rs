mod notes;
mod shares;
mod tokens;
mod users;

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::types::Type;
use rusqlite::{Connection, Result, Row};
use serde::de::DeserializeOwned;

use crate::error::AppError;

pub use notes::{
    delete_note, find_note, insert_note, list_notes, patch_movie, push_task, update_note,
    update_task, BodyPatch, MoviePatch, NoteFilter, NoteUpdate, SortOrder, TaskPatch,
};
pub use shares::{add_share, list_shared_with};
pub use tokens::{delete_token, find_token, replace_user_tokens};
pub use users::{find_user_by_email, find_user_by_id, insert_user, update_user_info};

pub type DbPool = Arc<Mutex<Connection>>;

const SCHEMA: &str = "
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        email TEXT UNIQUE NOT NULL,
        image TEXT NOT NULL DEFAULT '',
        password TEXT NOT NULL,
        created_at INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS access_tokens (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        token TEXT NOT NULL,
        user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        created_at INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS access_tokens_user_id ON access_tokens(user_id);

    CREATE TABLE IF NOT EXISTS notes (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        type TEXT NOT NULL CHECK (type IN ('text', 'todo', 'movie')),
        title TEXT NOT NULL,
        tags TEXT NOT NULL DEFAULT '[]',
        body TEXT NOT NULL, -- variant payload as JSON
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS notes_user_id ON notes(user_id, created_at);

    CREATE TABLE IF NOT EXISTS note_shares (
        note_id TEXT NOT NULL REFERENCES notes(id) ON DELETE CASCADE,
        user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        permission TEXT NOT NULL CHECK (permission IN ('read', 'write')),
        PRIMARY KEY (note_id, user_id)
    );
    CREATE INDEX IF NOT EXISTS note_shares_user_id ON note_shares(user_id);
";

pub fn init_db(path: impl AsRef<Path>) -> Result<DbPool> {
    let conn = Connection::open(path)?;
    init_schema(&conn)?;
    Ok(Arc::new(Mutex::new(conn)))
}

pub fn open_in_memory() -> Result<DbPool> {
    let conn = Connection::open_in_memory()?;
    init_schema(&conn)?;
    Ok(Arc::new(Mutex::new(conn)))
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)
}

fn lock(pool: &DbPool) -> Result<MutexGuard<'_, Connection>, AppError> {
    pool.lock()
        .map_err(|_| AppError::Database("connection lock poisoned".to_string()))
}

/// Read a TEXT column holding JSON.
fn json_column<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> Result<T> {
    let text: String = row.get(idx)?;
    serde_json::from_str(&text)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err)))
}

/// Whether `err` is the given extended constraint violation.
fn is_constraint(err: &rusqlite::Error, extended_code: std::ffi::c_int) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _) if failure.extended_code == extended_code
    )
}
