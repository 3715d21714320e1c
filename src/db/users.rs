use rusqlite::{ffi, Result, Row};

use super::{is_constraint, lock, DbPool};
use crate::error::AppError;
use crate::models::{ObjectId, User};

const USER_COLUMNS: &str = "id, name, email, image, password, created_at";

fn user_from_row(row: &Row<'_>) -> Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        image: row.get(3)?,
        password: row.get(4)?,
        created_at: row.get(5)?,
    })
}

pub fn insert_user(pool: &DbPool, user: &User) -> Result<(), AppError> {
    let conn = lock(pool)?;
    conn.execute(
        "INSERT INTO users (id, name, email, image, password, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        (
            &user.id,
            &user.name,
            &user.email,
            &user.image,
            &user.password,
            user.created_at,
        ),
    )
    .map_err(|err| {
        if is_constraint(&err, ffi::SQLITE_CONSTRAINT_UNIQUE) {
            AppError::Conflict("Email is already registered")
        } else {
            err.into()
        }
    })?;
    Ok(())
}

pub fn find_user_by_id(pool: &DbPool, id: &ObjectId) -> Result<Option<User>, AppError> {
    let conn = lock(pool)?;
    let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"))?;
    let mut rows = stmt.query([id])?;

    if let Some(row) = rows.next()? {
        Ok(Some(user_from_row(row)?))
    } else {
        Ok(None)
    }
}

pub fn find_user_by_email(pool: &DbPool, email: &str) -> Result<Option<User>, AppError> {
    let conn = lock(pool)?;
    let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"))?;
    let mut rows = stmt.query([email])?;

    if let Some(row) = rows.next()? {
        Ok(Some(user_from_row(row)?))
    } else {
        Ok(None)
    }
}

pub fn update_user_info(
    pool: &DbPool,
    id: &ObjectId,
    name: &str,
    image: &str,
) -> Result<bool, AppError> {
    let conn = lock(pool)?;
    let rows = conn.execute(
        "UPDATE users SET name = ?1, image = ?2 WHERE id = ?3",
        (name, image, id),
    )?;
    Ok(rows > 0)
}
