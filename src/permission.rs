use tracing::warn;

use crate::error::AppError;
use crate::models::{Note, ObjectId, Permission};

pub fn can_read(note: Option<&Note>, user_id: &ObjectId) -> bool {
    let Some(note) = note else {
        warn!(%user_id, "Read permission checked against a missing note");
        return false;
    };

    note.owned_by(user_id) || note.share_for(user_id).is_some()
}

pub fn can_write(note: Option<&Note>, user_id: &ObjectId) -> bool {
    let Some(note) = note else {
        warn!(%user_id, "Write permission checked against a missing note");
        return false;
    };

    note.owned_by(user_id)
        || note
            .share_for(user_id)
            .is_some_and(|share| share.permission == Permission::Write)
}

/// What a handler is about to do with a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
}

/// Gate a loaded note for `user_id`. Notes the user cannot see are reported
/// as missing; notes they can see but not change are forbidden.
pub fn authorize(note: Option<Note>, user_id: &ObjectId, access: Access) -> Result<Note, AppError> {
    if !can_read(note.as_ref(), user_id) {
        return Err(AppError::NotFound);
    }
    if access == Access::Write && !can_write(note.as_ref(), user_id) {
        warn!(%user_id, "Write denied on shared note");
        return Err(AppError::Forbidden);
    }
    note.ok_or(AppError::NotFound)
}
