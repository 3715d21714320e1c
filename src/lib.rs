pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod permission;
pub mod upload;
pub mod validation;

use std::path::PathBuf;
use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::{
    routing::{get, post, put},
    Router,
};
use db::DbPool;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;

use handlers::{auth as auth_handlers, movies, notes, profile, share, todos};

pub const API_PREFIX: &str = "/api/v1";

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub base_path: Arc<String>,
    pub public_dir: Arc<PathBuf>,
    pub cors_origin: Arc<String>,
}

fn cors_layer(origin: &str) -> CorsLayer {
    let origin = match HeaderValue::from_str(origin) {
        Ok(origin) => AllowOrigin::exact(origin),
        Err(_) => {
            tracing::warn!(origin, "Ignoring invalid CORS origin");
            AllowOrigin::list(Vec::<HeaderValue>::new())
        }
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

pub fn create_app(state: AppState) -> Router {
    let base_path = state.base_path.clone();

    let api_routes = Router::new()
        .route("/register", post(auth_handlers::register))
        .route("/login", post(auth_handlers::login))
        .route("/logout", post(auth_handlers::logout))
        .route(
            "/profile",
            get(profile::get_profile).put(profile::update_profile),
        )
        .route("/notes", get(notes::list).post(notes::create))
        .route("/notes/share", post(share::share_note))
        .route(
            "/notes/{id}",
            get(notes::get).put(notes::update).delete(notes::delete),
        )
        .route(
            "/notes/todo/{id}",
            post(todos::create_task).put(todos::update_task_fields),
        )
        .route("/notes/movie/{id}", put(movies::update_movie))
        .route("/shared-notes", get(share::list_shared));

    let app_routes = Router::new()
        .nest(API_PREFIX, api_routes)
        .nest_service("/public", ServeDir::new(state.public_dir.as_path()))
        .layer(
            tower::ServiceBuilder::new()
                .layer(tower_http::trace::TraceLayer::new_for_http())
                .layer(tower_http::compression::CompressionLayer::new())
                .layer(cors_layer(&state.cors_origin)),
        )
        .with_state(state);

    tracing::info!("base_path: {base_path:?}");

    if base_path.is_empty() {
        app_routes
    } else {
        Router::new().nest(&*base_path, app_routes)
    }
}
