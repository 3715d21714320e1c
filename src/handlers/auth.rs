use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::auth::{hash_password, issue_token, verify_dummy_password, verify_password};
use crate::db::{delete_token, find_user_by_email, insert_user};
use crate::error::AppError;
use crate::middleware::AuthenticatedUser;
use crate::models::requests::{LoginRequest, RegisterRequest};
use crate::models::{now, LoginResponse, ObjectId, User};
use crate::validation::Valid;
use crate::AppState;

fn login_user(state: &AppState, req: &LoginRequest) -> Result<LoginResponse, AppError> {
    let Some(user) = find_user_by_email(&state.db, &req.email)? else {
        verify_dummy_password(&req.password);
        warn!("Login attempt for unknown email");
        return Err(AppError::InvalidCredentials);
    };

    if !verify_password(&req.password, &user.password) {
        warn!(user_id = %user.id, "Login attempt with wrong password");
        return Err(AppError::InvalidCredentials);
    }

    let token = issue_token(&state.db, &user.id)?;
    info!(user_id = %user.id, "User logged in");

    Ok(LoginResponse {
        name: user.name,
        email: user.email,
        image: user.image,
        token,
    })
}

pub async fn register(
    State(state): State<AppState>,
    Valid(req): Valid<RegisterRequest>,
) -> Result<(StatusCode, Json<LoginResponse>), AppError> {
    let user = User {
        id: ObjectId::new(),
        name: req.name.clone(),
        email: req.email.clone(),
        image: String::new(),
        password: hash_password(&req.password)?,
        created_at: now(),
    };

    insert_user(&state.db, &user)?;
    info!(user_id = %user.id, "Registered user");

    let response = login_user(&state, &req.as_login())?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn login(
    State(state): State<AppState>,
    Valid(req): Valid<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    login_user(&state, &req).map(Json)
}

pub async fn logout(
    auth: AuthenticatedUser,
    State(state): State<AppState>,
) -> Result<Json<Value>, AppError> {
    delete_token(&state.db, &auth.token_id)?;
    info!(user_id = %auth.user_id, "User logged out");
    Ok(Json(json!({ "success": true })))
}
