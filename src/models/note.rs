use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{now, ObjectId, UserSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Read,
    Write,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::Read => "read",
            Permission::Write => "write",
        }
    }
}

impl FromStr for Permission {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" => Ok(Permission::Read),
            "write" => Ok(Permission::Write),
            _ => Err(()),
        }
    }
}

/// A grant of access to one note for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Share {
    pub user_id: ObjectId,
    pub permission: Permission,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteKind {
    Text,
    Todo,
    Movie,
}

impl NoteKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoteKind::Text => "text",
            NoteKind::Todo => "todo",
            NoteKind::Movie => "movie",
        }
    }
}

impl fmt::Display for NoteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NoteKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(NoteKind::Text),
            "todo" => Ok(NoteKind::Todo),
            "movie" => Ok(NoteKind::Movie),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: ObjectId,
    pub content: String,
    pub is_completed: bool,
    pub completed_at: Option<i64>,
}

impl Task {
    pub fn new(content: impl Into<String>) -> Self {
        Task {
            id: ObjectId::new(),
            content: content.into(),
            is_completed: false,
            completed_at: None,
        }
    }

    /// Completing stamps the current time, reopening clears it.
    pub fn completion(is_completed: bool) -> Option<i64> {
        is_completed.then(now)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextNote {
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoNote {
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieNote {
    pub year: i64,
    pub watched: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub director: Option<String>,
}

/// The type-specific part of a note. Stored as its own JSON document and
/// flattened into the note when sent to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NoteBody {
    Text { text_note: TextNote },
    Todo { todo_note: TodoNote },
    Movie { movie_note: MovieNote },
}

impl NoteBody {
    pub fn kind(&self) -> NoteKind {
        match self {
            NoteBody::Text { .. } => NoteKind::Text,
            NoteBody::Todo { .. } => NoteKind::Todo,
            NoteBody::Movie { .. } => NoteKind::Movie,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: ObjectId,
    pub title: String,
    pub tags: Vec<String>,
    pub user_id: ObjectId,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shared_with: Vec<Share>,
    #[serde(flatten)]
    pub body: NoteBody,
}

impl Note {
    pub fn new(user_id: ObjectId, title: String, tags: Vec<String>, body: NoteBody) -> Self {
        let now = now();
        Note {
            id: ObjectId::new(),
            title,
            tags,
            user_id,
            created_at: now,
            updated_at: now,
            shared_with: Vec::new(),
            body,
        }
    }

    pub fn kind(&self) -> NoteKind {
        self.body.kind()
    }

    pub fn owned_by(&self, user_id: &ObjectId) -> bool {
        self.user_id == *user_id
    }

    pub fn share_for(&self, user_id: &ObjectId) -> Option<&Share> {
        self.shared_with.iter().find(|share| share.user_id == *user_id)
    }
}

/// A note without its payload, as returned by listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteSummary {
    pub id: ObjectId,
    #[serde(rename = "type")]
    pub kind: NoteKind,
    pub title: String,
    pub tags: Vec<String>,
    pub user_id: ObjectId,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedUser {
    pub user: UserSummary,
    pub permission: Permission,
}

/// A note shared with the caller, with its grants resolved to users.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedNote {
    #[serde(flatten)]
    pub note: NoteSummary,
    pub shared_with: Vec<SharedUser>,
}
