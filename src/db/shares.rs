use rusqlite::ffi;

use super::notes::{permission_column, summaries};
use super::{is_constraint, lock, DbPool};
use crate::error::AppError;
use crate::models::{ObjectId, Share, SharedNote, SharedUser, UserSummary};

/// Grant `share` on a note. A user holds at most one grant per note.
pub fn add_share(pool: &DbPool, note_id: &ObjectId, share: &Share) -> Result<(), AppError> {
    let conn = lock(pool)?;
    conn.execute(
        "INSERT INTO note_shares (note_id, user_id, permission) VALUES (?1, ?2, ?3)",
        (note_id, &share.user_id, share.permission.as_str()),
    )
    .map_err(|err| {
        if is_constraint(&err, ffi::SQLITE_CONSTRAINT_PRIMARYKEY) {
            AppError::Conflict("User already has access to this note")
        } else {
            err.into()
        }
    })?;
    Ok(())
}

/// Notes shared with `user_id`. Each note carries only the caller's own
/// grant, so other grantees stay hidden.
pub fn list_shared_with(pool: &DbPool, user_id: &ObjectId) -> Result<Vec<SharedNote>, AppError> {
    let conn = lock(pool)?;
    let notes = summaries(
        &conn,
        "SELECT n.id, n.type, n.title, n.tags, n.user_id, n.created_at, n.updated_at
         FROM notes n JOIN note_shares s ON s.note_id = n.id
         WHERE s.user_id = ?1
         ORDER BY n.created_at DESC, n.rowid DESC",
        rusqlite::params![user_id],
    )?;

    let mut stmt = conn.prepare(
        "SELECT u.id, u.name, u.email, u.image, s.permission
         FROM note_shares s JOIN users u ON u.id = s.user_id
         WHERE s.note_id = ?1 AND s.user_id = ?2",
    )?;

    let mut shared = Vec::with_capacity(notes.len());
    for note in notes {
        let shared_with = stmt
            .query_map(rusqlite::params![&note.id, user_id], |row| {
                Ok(SharedUser {
                    user: UserSummary {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        email: row.get(2)?,
                        image: row.get(3)?,
                    },
                    permission: permission_column(row, 4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        shared.push(SharedNote { note, shared_with });
    }
    Ok(shared)
}
