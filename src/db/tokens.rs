use rusqlite::{Result, Row};

use super::{lock, DbPool};
use crate::error::AppError;
use crate::models::{AccessToken, ObjectId};

fn token_from_row(row: &Row<'_>) -> Result<AccessToken> {
    Ok(AccessToken {
        id: row.get(0)?,
        name: row.get(1)?,
        token: row.get(2)?,
        user_id: row.get(3)?,
        created_at: row.get(4)?,
    })
}

/// Drop every token of `token.user_id` and store `token` in their place, so a
/// user has at most one live session.
pub fn replace_user_tokens(pool: &DbPool, token: &AccessToken) -> Result<(), AppError> {
    let mut conn = lock(pool)?;
    let tx = conn.transaction()?;
    tx.execute(
        "DELETE FROM access_tokens WHERE user_id = ?1",
        [&token.user_id],
    )?;
    tx.execute(
        "INSERT INTO access_tokens (id, name, token, user_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        (
            &token.id,
            &token.name,
            &token.token,
            &token.user_id,
            token.created_at,
        ),
    )?;
    tx.commit()?;
    Ok(())
}

pub fn find_token(pool: &DbPool, id: &ObjectId) -> Result<Option<AccessToken>, AppError> {
    let conn = lock(pool)?;
    let mut stmt = conn.prepare(
        "SELECT id, name, token, user_id, created_at FROM access_tokens WHERE id = ?1",
    )?;
    let mut rows = stmt.query([id])?;

    if let Some(row) = rows.next()? {
        Ok(Some(token_from_row(row)?))
    } else {
        Ok(None)
    }
}

pub fn delete_token(pool: &DbPool, id: &ObjectId) -> Result<bool, AppError> {
    let conn = lock(pool)?;
    let rows = conn.execute("DELETE FROM access_tokens WHERE id = ?1", [id])?;
    Ok(rows > 0)
}
