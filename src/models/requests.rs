use crate::shape;

shape! {
    pub struct RegisterRequest {
        name: String => "required",
        email: String => "required|email",
        password: String => "required|min:6",
    }
}

impl RegisterRequest {
    pub fn as_login(&self) -> LoginRequest {
        LoginRequest {
            email: self.email.clone(),
            password: self.password.clone(),
        }
    }
}

shape! {
    pub struct LoginRequest {
        email: String => "required|email",
        password: String => "required",
    }
}

shape! {
    pub struct ProfileRequest {
        name: String => "required",
    }
}

shape! {
    /// Fields common to every note on creation.
    pub struct NoteRequest {
        kind as "type": String => "required|in:movie,todo,text",
        title: String => "required",
        tags: Vec<String> => "array",
    }
}

shape! {
    /// Fields common to every note on update. The type cannot change.
    pub struct NoteUpdateRequest {
        title: String => "required",
        tags: Vec<String> => "array",
    }
}

shape! {
    pub struct TextRequest {
        content: String => "required",
    }
}

shape! {
    pub struct TodoRequest {
        tasks: Vec<String> => "required|array",
    }
}

shape! {
    pub struct MovieRequest {
        year: i64 => "required|numeric",
        watched: bool => "required|boolean",
        director: String => "",
    }
}

shape! {
    pub struct MovieUpdateRequest {
        year: i64 => "required|numeric",
        director: String => "",
    }
}

shape! {
    pub struct TaskRequest {
        content: String => "required",
    }
}

shape! {
    pub struct TaskUpdateRequest {
        task_id: String => "required",
        content: Option<String> => "",
        is_completed: Option<bool> => "",
    }
}

shape! {
    pub struct ShareRequest {
        user_id: String => "required",
        note_id: String => "required",
        permission: String => "required|in:read,write",
    }
}
