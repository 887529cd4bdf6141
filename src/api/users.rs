//! User management endpoints (admin only)

use crate::api::{hash_password, ApiError, AppState};
use crate::auth::{guard, Identity};
use crate::models::{
    validate_text, CreateUserRequest, EditUserRequest, UpdatePasswordRequest, UserResponse,
    MAX_USERNAME_LEN, MAX_USER_NAME_LEN,
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use tracing::info;

/// bcrypt only reads the first 72 bytes of a password.
const MAX_PASSWORD_LEN: usize = 72;

/// GET /users
pub async fn list_users(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    guard::require_admin(&identity)?;

    let users = state.store.list_users()?;
    Ok(Json(users.iter().map(UserResponse::from_user).collect()))
}

/// POST /users
pub async fn create_user(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<Json<UserResponse>, ApiError> {
    guard::require_admin(&identity)?;
    let Json(payload) = payload?;

    validate_text("name", &payload.name, MAX_USER_NAME_LEN).map_err(ApiError::BadRequest)?;
    validate_text("username", &payload.username, MAX_USERNAME_LEN)
        .map_err(ApiError::BadRequest)?;
    validate_password(&payload.password)?;

    let password_hash = hash_password(&state, payload.password).await?;

    // Uniqueness is left to the store's constraint; no pre-check.
    let user = state.store.create_user(
        &payload.name,
        &payload.username,
        &password_hash,
        payload.is_admin,
    )?;

    info!(by = identity.user_id, "User created: {} (admin: {})", user.username, user.is_admin);

    Ok(Json(UserResponse::from_user(&user)))
}

/// PUT /users/:id
pub async fn edit_user(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
    payload: Result<Json<EditUserRequest>, JsonRejection>,
) -> Result<Json<UserResponse>, ApiError> {
    guard::require_admin(&identity)?;
    let Json(payload) = payload?;
    validate_text("name", &payload.name, MAX_USER_NAME_LEN).map_err(ApiError::BadRequest)?;

    let user = state
        .store
        .rename_user(id, &payload.name)?
        .ok_or(ApiError::NotFound("User not found"))?;

    Ok(Json(UserResponse::from_user(&user)))
}

/// PUT /users/:id/password
pub async fn update_password(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
    payload: Result<Json<UpdatePasswordRequest>, JsonRejection>,
) -> Result<Json<UserResponse>, ApiError> {
    guard::require_admin(&identity)?;
    let Json(payload) = payload?;
    validate_password(&payload.password)?;

    if state.store.get_user(id)?.is_none() {
        return Err(ApiError::NotFound("User not found"));
    }

    let password_hash = hash_password(&state, payload.password).await?;
    let user = state
        .store
        .set_password_hash(id, &password_hash)?
        .ok_or(ApiError::NotFound("User not found"))?;

    info!(by = identity.user_id, "Password reset for user {}", user.username);

    Ok(Json(UserResponse::from_user(&user)))
}

/// DELETE /users/:id
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    guard::require_admin(&identity)?;

    if !state.store.delete_user(id)? {
        return Err(ApiError::NotFound("User not found"));
    }

    info!(by = identity.user_id, "User deleted: {}", id);

    Ok(StatusCode::NO_CONTENT)
}

fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.is_empty() {
        return Err(ApiError::BadRequest("password must not be empty".to_string()));
    }
    if password.len() > MAX_PASSWORD_LEN {
        return Err(ApiError::BadRequest(format!(
            "password must be at most {MAX_PASSWORD_LEN} bytes"
        )));
    }
    Ok(())
}
