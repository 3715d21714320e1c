use std::sync::Arc;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::net::TcpListener;

use memo::{create_app, db, AppState};

struct TestServer {
    addr: String,
    client: Client,
    public_dir: TempDir,
}

impl TestServer {
    async fn new() -> Self {
        Self::with_base_path("").await
    }

    async fn with_base_path(base_path: &str) -> Self {
        let db = db::open_in_memory().expect("Failed to create in-memory database");
        let public_dir = tempfile::tempdir().expect("Failed to create public dir");

        let state = AppState {
            db,
            base_path: Arc::new(base_path.to_string()),
            public_dir: Arc::new(public_dir.path().to_path_buf()),
            cors_origin: Arc::new("http://localhost:5173".to_string()),
        };
        let app = create_app(state);

        // Bind to random available port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = format!("http://{}{}", listener.local_addr().unwrap(), base_path);

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("Failed to create client");

        TestServer {
            addr,
            client,
            public_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    fn api(&self, path: &str) -> String {
        self.url(&format!("/api/v1{path}"))
    }

    fn get(&self, path: &str, token: &str) -> RequestBuilder {
        self.client.get(self.api(path)).bearer_auth(token)
    }

    fn post(&self, path: &str, token: &str) -> RequestBuilder {
        self.client.post(self.api(path)).bearer_auth(token)
    }

    fn put(&self, path: &str, token: &str) -> RequestBuilder {
        self.client.put(self.api(path)).bearer_auth(token)
    }

    fn delete(&self, path: &str, token: &str) -> RequestBuilder {
        self.client.delete(self.api(path)).bearer_auth(token)
    }

    /// Register a user and return their token.
    async fn register(&self, name: &str) -> String {
        let resp = self
            .client
            .post(self.api("/register"))
            .json(&json!({
                "name": name,
                "email": format!("{name}@example.com"),
                "password": "secret1",
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = resp.json().await.unwrap();
        body["token"].as_str().unwrap().to_string()
    }

    async fn user_id(&self, token: &str) -> String {
        let resp = self.get("/profile", token).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = resp.json().await.unwrap();
        body["id"].as_str().unwrap().to_string()
    }

    async fn create_note(&self, token: &str, note: Value) -> Value {
        let resp = self.post("/notes", token).json(&note).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        resp.json().await.unwrap()
    }

    async fn share(
        &self,
        token: &str,
        note_id: &str,
        user_id: &str,
        permission: &str,
    ) -> StatusCode {
        self.post("/notes/share", token)
            .json(&json!({
                "note_id": note_id,
                "user_id": user_id,
                "permission": permission,
            }))
            .send()
            .await
            .unwrap()
            .status()
    }
}

fn text_note(title: &str) -> Value {
    json!({"type": "text", "title": title, "tags": ["misc"], "content": "hello"})
}

#[tokio::test]
async fn test_register_returns_client_token() {
    let server = TestServer::new().await;

    let resp = server
        .client
        .post(server.api("/register"))
        .json(&json!({"name": "Alice", "email": "alice@example.com", "password": "secret1"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["name"], "Alice");
    assert_eq!(body["email"], "alice@example.com");
    assert_eq!(body["image"], "");
    let token = body["token"].as_str().unwrap();
    assert_eq!(token.matches('|').count(), 1);
    let (id, secret) = token.split_once('|').unwrap();
    assert_eq!(id.len(), 24);
    assert_eq!(secret.len(), 48);
    assert!(body.get("password").is_none());
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let server = TestServer::new().await;
    server.register("alice").await;

    let resp = server
        .client
        .post(server.api("/register"))
        .json(&json!({"name": "Other", "email": "alice@example.com", "password": "secret2"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_validation_errors_are_aggregated() {
    let server = TestServer::new().await;

    let resp = server
        .client
        .post(server.api("/register"))
        .json(&json!({"name": "", "email": "nope", "password": "abc"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "request not valid");
    assert_eq!(
        body["errors"],
        json!({"name": "required", "email": "email", "password": "min:6"})
    );
}

#[tokio::test]
async fn test_malformed_body_reports_missing_fields() {
    let server = TestServer::new().await;

    let resp = server
        .client
        .post(server.api("/login"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["errors"]["email"], "required");
    assert_eq!(body["errors"]["password"], "required");
}

#[tokio::test]
async fn test_login_failures_look_the_same() {
    let server = TestServer::new().await;
    server.register("alice").await;

    for (email, password) in [
        ("alice@example.com", "wrongpassword"),
        ("nobody@example.com", "secret1"),
    ] {
        let resp = server
            .client
            .post(server.api("/login"))
            .json(&json!({"email": email, "password": password}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["error"], "Can't login");
    }
}

#[tokio::test]
async fn test_second_login_invalidates_first_token() {
    let server = TestServer::new().await;
    let first = server.register("alice").await;

    let resp = server
        .client
        .post(server.api("/login"))
        .json(&json!({"email": "alice@example.com", "password": "secret1"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    let second = body["token"].as_str().unwrap().to_string();
    assert_ne!(first, second);

    let resp = server.get("/profile", &first).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = server.get("/profile", &second).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_bad_tokens_are_rejected() {
    let server = TestServer::new().await;
    let token = server.register("alice").await;
    let (id, secret) = token.split_once('|').unwrap();

    let resp = server
        .client
        .get(server.api("/notes"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let mut tampered = secret.to_string().into_bytes();
    tampered[0] = if tampered[0] == b'a' { b'b' } else { b'a' };
    let tampered = format!("{id}|{}", String::from_utf8(tampered).unwrap());

    for bad in [
        "garbage".to_string(),
        secret.to_string(),
        format!("{id}|"),
        format!("{id}|{secret}|extra"),
        tampered,
    ] {
        let resp = server.get("/notes", &bad).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "accepted {bad:?}");
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["error"], "Unauthorized");
    }
}

#[tokio::test]
async fn test_logout_revokes_token() {
    let server = TestServer::new().await;
    let token = server.register("alice").await;

    let resp = server.post("/logout", &token).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = server.get("/profile", &token).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_text_note_crud() {
    let server = TestServer::new().await;
    let token = server.register("alice").await;

    let note = server.create_note(&token, text_note("Draft")).await;
    assert_eq!(note["type"], "text");
    assert_eq!(note["title"], "Draft");
    assert_eq!(note["tags"], json!(["misc"]));
    assert_eq!(note["text_note"]["content"], "hello");
    let id = note["id"].as_str().unwrap();

    let resp = server.get(&format!("/notes/{id}"), &token).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let fetched: Value = resp.json().await.unwrap();
    assert_eq!(fetched["text_note"]["content"], "hello");

    let resp = server
        .put(&format!("/notes/{id}"), &token)
        .json(&json!({"title": "Final", "tags": ["done"], "content": "bye", "type": "movie"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Value = resp.json().await.unwrap();
    assert_eq!(updated["title"], "Final");
    assert_eq!(updated["tags"], json!(["done"]));
    assert_eq!(updated["type"], "text");
    assert_eq!(updated["text_note"]["content"], "bye");

    let resp = server.delete(&format!("/notes/{id}"), &token).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = server.get(&format!("/notes/{id}"), &token).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = server.delete(&format!("/notes/{id}"), &token).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_note_variant_fields_are_validated() {
    let server = TestServer::new().await;
    let token = server.register("alice").await;

    let resp = server
        .post("/notes", &token)
        .json(&json!({"type": "poem", "tags": []}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body["errors"],
        json!({"type": "in:movie,todo,text", "title": "required"})
    );

    let resp = server
        .post("/notes", &token)
        .json(&json!({"type": "movie", "title": "Heat", "tags": [], "year": "1995"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["errors"], json!({"year": "numeric", "watched": "required"}));

    let resp = server
        .post("/notes", &token)
        .json(&json!({"type": "todo", "title": "Chores", "tags": []}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["errors"]["tasks"], "required");
}

#[tokio::test]
async fn test_list_filters_and_sorts() {
    let server = TestServer::new().await;
    let token = server.register("alice").await;
    let other = server.register("bob").await;

    server.create_note(&token, text_note("first")).await;
    server
        .create_note(
            &token,
            json!({"type": "movie", "title": "second", "tags": [], "year": 1999, "watched": false}),
        )
        .await;
    server
        .create_note(
            &token,
            json!({"type": "todo", "title": "third", "tags": [], "tasks": ["a"]}),
        )
        .await;
    server.create_note(&other, text_note("not mine")).await;

    let resp = server.get("/notes?sort=asc", &token).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let notes: Vec<Value> = resp.json().await.unwrap();
    let titles: Vec<_> = notes.iter().map(|n| n["title"].as_str().unwrap()).collect();
    assert_eq!(titles, ["first", "second", "third"]);
    assert!(notes[0].get("text_note").is_none());

    let resp = server.get("/notes", &token).send().await.unwrap();
    let notes: Vec<Value> = resp.json().await.unwrap();
    assert_eq!(notes[0]["title"], "third");

    let resp = server.get("/notes?type=movie", &token).send().await.unwrap();
    let notes: Vec<Value> = resp.json().await.unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0]["type"], "movie");

    let resp = server.get("/notes?type=all", &token).send().await.unwrap();
    let notes: Vec<Value> = resp.json().await.unwrap();
    assert_eq!(notes.len(), 3);
}

#[tokio::test]
async fn test_todo_tasks() {
    let server = TestServer::new().await;
    let token = server.register("alice").await;

    let note = server
        .create_note(
            &token,
            json!({"type": "todo", "title": "Groceries", "tags": [], "tasks": ["milk"]}),
        )
        .await;
    let id = note["id"].as_str().unwrap();
    assert_eq!(note["todo_note"]["tasks"][0]["content"], "milk");
    assert_eq!(note["todo_note"]["tasks"][0]["is_completed"], false);

    let resp = server
        .post(&format!("/notes/todo/{id}"), &token)
        .json(&json!({"content": "eggs"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    let task_id = body["task_id"].as_str().unwrap().to_string();

    let resp = server
        .put(&format!("/notes/todo/{id}"), &token)
        .json(&json!({"task_id": task_id, "is_completed": true}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let note: Value = resp.json().await.unwrap();
    let tasks = note["todo_note"]["tasks"].as_array().unwrap();
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[1]["id"], task_id.as_str());
    assert_eq!(tasks[1]["content"], "eggs");
    assert_eq!(tasks[1]["is_completed"], true);
    assert!(tasks[1]["completed_at"].is_i64());
    assert_eq!(tasks[0]["is_completed"], false);

    let resp = server
        .put(&format!("/notes/todo/{id}"), &token)
        .json(&json!({"task_id": task_id, "is_completed": false, "content": "brown eggs"}))
        .send()
        .await
        .unwrap();
    let note: Value = resp.json().await.unwrap();
    let task = &note["todo_note"]["tasks"][1];
    assert_eq!(task["content"], "brown eggs");
    assert_eq!(task["is_completed"], false);
    assert!(task["completed_at"].is_null());

    let resp = server
        .put(&format!("/notes/todo/{id}"), &token)
        .json(&json!({"task_id": task_id}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = server
        .put(&format!("/notes/todo/{id}"), &token)
        .json(&json!({"task_id": "000000000000000000000000", "is_completed": true}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let text = server.create_note(&token, text_note("plain")).await;
    let resp = server
        .post(&format!("/notes/todo/{}", text["id"].as_str().unwrap()), &token)
        .json(&json!({"content": "nope"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_generic_update_leaves_tasks_alone() {
    let server = TestServer::new().await;
    let token = server.register("alice").await;

    let note = server
        .create_note(
            &token,
            json!({"type": "todo", "title": "Chores", "tags": ["home"], "tasks": ["dishes"]}),
        )
        .await;
    let id = note["id"].as_str().unwrap();
    let tasks = note["todo_note"]["tasks"].clone();

    let resp = server
        .put(&format!("/notes/{id}"), &token)
        .json(&json!({"title": "Weekend", "tags": [], "tasks": ["x", "y"]}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let note: Value = resp.json().await.unwrap();
    assert_eq!(note["title"], "Weekend");
    assert_eq!(note["tags"], json!([]));
    assert_eq!(note["todo_note"]["tasks"], tasks);

    let resp = server.get(&format!("/notes/{id}"), &token).send().await.unwrap();
    let note: Value = resp.json().await.unwrap();
    assert_eq!(note["todo_note"]["tasks"], tasks);
}

#[tokio::test]
async fn test_movie_patch() {
    let server = TestServer::new().await;
    let token = server.register("alice").await;

    let note = server
        .create_note(
            &token,
            json!({"type": "movie", "title": "Alien", "tags": [], "year": 1978, "watched": false}),
        )
        .await;
    let id = note["id"].as_str().unwrap();
    assert!(note["movie_note"].get("director").is_none());

    let resp = server
        .put(&format!("/notes/movie/{id}"), &token)
        .json(&json!({"year": 1979, "watched": true, "director": "Scott"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let note: Value = resp.json().await.unwrap();
    assert_eq!(
        note["movie_note"],
        json!({"year": 1979, "watched": true, "director": "Scott"})
    );
    assert_eq!(note["title"], "Alien");

    let resp = server
        .put(&format!("/notes/movie/{id}"), &token)
        .json(&json!({"year": 1979}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_sharing_grants_and_limits_access() {
    let server = TestServer::new().await;
    let owner = server.register("owner").await;
    let reader = server.register("reader").await;
    let writer = server.register("writer").await;
    let stranger = server.register("stranger").await;
    let reader_id = server.user_id(&reader).await;
    let writer_id = server.user_id(&writer).await;

    let note = server.create_note(&owner, text_note("Shared")).await;
    let id = note["id"].as_str().unwrap();

    assert_eq!(server.share(&owner, id, &reader_id, "read").await, StatusCode::CREATED);
    assert_eq!(server.share(&owner, id, &writer_id, "write").await, StatusCode::CREATED);
    assert_eq!(server.share(&owner, id, &reader_id, "write").await, StatusCode::CONFLICT);

    let resp = server.get(&format!("/notes/{id}"), &reader).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let update = json!({"title": "Changed", "tags": [], "content": "x"});
    let resp = server
        .put(&format!("/notes/{id}"), &reader)
        .json(&update)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = server
        .put(&format!("/notes/{id}"), &writer)
        .json(&update)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = server.get(&format!("/notes/{id}"), &stranger).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = server
        .put(&format!("/notes/{id}"), &stranger)
        .json(&update)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // Only the owner deletes.
    let resp = server.delete(&format!("/notes/{id}"), &writer).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let stranger_id = server.user_id(&stranger).await;
    assert_eq!(server.share(&reader, id, &stranger_id, "read").await, StatusCode::FORBIDDEN);
    assert_eq!(server.share(&stranger, id, &reader_id, "read").await, StatusCode::NOT_FOUND);

    let resp = server.get("/shared-notes", &reader).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let shared: Vec<Value> = resp.json().await.unwrap();
    assert_eq!(shared.len(), 1);
    assert_eq!(shared[0]["id"], id);
    assert_eq!(shared[0]["title"], "Changed");
    // Other grantees are not disclosed.
    let grants = shared[0]["shared_with"].as_array().unwrap();
    assert_eq!(grants.len(), 1);
    assert_eq!(grants[0]["user"]["email"], "reader@example.com");
    assert_eq!(grants[0]["permission"], "read");

    let resp = server.get("/shared-notes", &writer).send().await.unwrap();
    let shared: Vec<Value> = resp.json().await.unwrap();
    let grants = shared[0]["shared_with"].as_array().unwrap();
    assert_eq!(grants.len(), 1);
    assert_eq!(grants[0]["user"]["name"], "writer");
    assert_eq!(grants[0]["permission"], "write");

    let resp = server.get("/shared-notes", &owner).send().await.unwrap();
    let shared: Vec<Value> = resp.json().await.unwrap();
    assert!(shared.is_empty());
}

#[tokio::test]
async fn test_todo_and_movie_writes_need_write_access() {
    let server = TestServer::new().await;
    let owner = server.register("owner").await;
    let reader = server.register("reader").await;
    let writer = server.register("writer").await;
    let reader_id = server.user_id(&reader).await;
    let writer_id = server.user_id(&writer).await;

    let todo = server
        .create_note(
            &owner,
            json!({"type": "todo", "title": "Trip", "tags": [], "tasks": ["tickets"]}),
        )
        .await;
    let todo_id = todo["id"].as_str().unwrap();
    let task_id = todo["todo_note"]["tasks"][0]["id"].as_str().unwrap();
    let movie = server
        .create_note(
            &owner,
            json!({"type": "movie", "title": "Heat", "tags": [], "year": 1995, "watched": false}),
        )
        .await;
    let movie_id = movie["id"].as_str().unwrap();

    for id in [todo_id, movie_id] {
        assert_eq!(server.share(&owner, id, &reader_id, "read").await, StatusCode::CREATED);
        assert_eq!(server.share(&owner, id, &writer_id, "write").await, StatusCode::CREATED);
    }

    let add_task = json!({"content": "hotel"});
    let patch_task = json!({"task_id": task_id, "is_completed": true});
    let patch_movie = json!({"year": 1995, "watched": true, "director": "Mann"});

    for (token, expected) in [(&reader, StatusCode::FORBIDDEN), (&writer, StatusCode::OK)] {
        let resp = server
            .post(&format!("/notes/todo/{todo_id}"), token)
            .json(&add_task)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), expected);

        let resp = server
            .put(&format!("/notes/todo/{todo_id}"), token)
            .json(&patch_task)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), expected);

        let resp = server
            .put(&format!("/notes/movie/{movie_id}"), token)
            .json(&patch_movie)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), expected);
    }

    let resp = server.get(&format!("/notes/{todo_id}"), &owner).send().await.unwrap();
    let note: Value = resp.json().await.unwrap();
    let tasks = note["todo_note"]["tasks"].as_array().unwrap();
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0]["is_completed"], true);

    let resp = server.get(&format!("/notes/{movie_id}"), &owner).send().await.unwrap();
    let note: Value = resp.json().await.unwrap();
    assert_eq!(note["movie_note"]["director"], "Mann");
}

#[tokio::test]
async fn test_share_rejections() {
    let server = TestServer::new().await;
    let owner = server.register("owner").await;
    let owner_id = server.user_id(&owner).await;
    let note = server.create_note(&owner, text_note("Mine")).await;
    let id = note["id"].as_str().unwrap();

    let resp = server
        .post("/notes/share", &owner)
        .json(&json!({"note_id": id, "user_id": owner_id, "permission": "read"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Can't share the note with yourself.");

    assert_eq!(
        server.share(&owner, id, "000000000000000000000000", "read").await,
        StatusCode::NOT_FOUND
    );

    let resp = server
        .post("/notes/share", &owner)
        .json(&json!({"note_id": id, "user_id": "x", "permission": "admin"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["errors"]["permission"], "in:read,write");
}

#[tokio::test]
async fn test_profile_update_with_image() {
    let server = TestServer::new().await;
    let token = server.register("alice").await;

    let png = vec![0x89, b'P', b'N', b'G', 0, 1, 2, 3];
    let form = Form::new().text("name", "Alice Cooper").part(
        "image",
        Part::bytes(png.clone())
            .file_name("me.png")
            .mime_str("image/png")
            .unwrap(),
    );
    let resp = server.put("/profile", &token).multipart(form).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["name"], "Alice Cooper");
    let first = body["image"].as_str().unwrap().to_string();
    assert!(first.starts_with("public/images/image-"));
    assert!(first.ends_with(".png"));

    let stored = server
        .public_dir
        .path()
        .join(first.strip_prefix("public/").unwrap());
    assert_eq!(std::fs::read(&stored).unwrap(), png);

    let resp = server
        .client
        .get(server.url(&format!("/{first}")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.bytes().await.unwrap().to_vec(), png);

    // A name-only update keeps the image.
    let form = Form::new().text("name", "Alice");
    let resp = server.put("/profile", &token).multipart(form).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["image"], first.as_str());

    // A new image replaces the old file.
    let form = Form::new().text("name", "Alice").part(
        "image",
        Part::bytes(vec![0xff, 0xd8, 0xff])
            .file_name("me.jpg")
            .mime_str("image/jpeg")
            .unwrap(),
    );
    let resp = server.put("/profile", &token).multipart(form).send().await.unwrap();
    let body: Value = resp.json().await.unwrap();
    let second = body["image"].as_str().unwrap();
    assert!(second.ends_with(".jpg"));
    assert!(!stored.exists());

    let resp = server.get("/profile", &token).send().await.unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["name"], "Alice");
    assert_eq!(body["image"], second);
}

#[tokio::test]
async fn test_profile_update_rejections() {
    let server = TestServer::new().await;
    let token = server.register("alice").await;

    let form = Form::new().text("name", "  ");
    let resp = server.put("/profile", &token).multipart(form).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["errors"]["name"], "required");

    let form = Form::new().text("name", "Alice").part(
        "image",
        Part::bytes(vec![b'G', b'I', b'F'])
            .file_name("me.gif")
            .mime_str("image/gif")
            .unwrap(),
    );
    let resp = server.put("/profile", &token).multipart(form).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let form = Form::new().text("name", "Alice").part(
        "image",
        Part::bytes(vec![0u8; 1_000_001])
            .file_name("big.png")
            .mime_str("image/png")
            .unwrap(),
    );
    let resp = server.put("/profile", &token).multipart(form).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = server.get("/profile", &token).send().await.unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["name"], "alice");
    assert_eq!(body["image"], "");
}

#[tokio::test]
async fn test_base_path_nesting() {
    let server = TestServer::with_base_path("/memo").await;
    let token = server.register("alice").await;

    let resp = server.get("/notes", &token).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let bare = server.addr.trim_end_matches("/memo").to_string();
    let resp = server
        .client
        .get(format!("{bare}/api/v1/notes"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
