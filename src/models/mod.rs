mod id;
mod note;
pub mod requests;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

pub use id::{InvalidId, ObjectId};
pub use note::{
    MovieNote, Note, NoteBody, NoteKind, NoteSummary, Permission, Share, SharedNote, SharedUser,
    Task, TextNote, TodoNote,
};

/// Current time as unix seconds, the resolution every stored timestamp uses.
pub fn now() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: ObjectId,
    pub name: String,
    pub email: String,
    pub image: String,
    #[serde(skip)]
    pub password: String,
    pub created_at: i64,
}

impl User {
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            image: self.image.clone(),
        }
    }
}

/// The part of a user other users may see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: ObjectId,
    pub name: String,
    pub email: String,
    pub image: String,
}

/// A stored access token. `token` holds the digest of the secret, never the
/// secret itself.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub id: ObjectId,
    pub name: String,
    pub token: String,
    pub user_id: ObjectId,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub name: String,
    pub email: String,
    pub image: String,
    pub token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileResponse {
    pub name: String,
    pub image: String,
}
