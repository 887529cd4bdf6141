//! Authentication API Endpoints
//! Mission: Exchange credentials for a signed bearer token

use crate::api::{verify_decoy, verify_password, ApiError, AppState};
use crate::auth::models::{LoginRequest, LoginResponse};
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use tracing::{error, info, warn};

/// Login endpoint - POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(payload) = payload?;
    info!("Login attempt: {}", payload.username);

    // Unknown user and wrong password look identical to the caller.
    let Some(user) = state.store.get_user_by_username(&payload.username)? else {
        warn!("Failed login attempt (unknown user): {}", payload.username);
        verify_decoy(&state, payload.password).await?;
        return Err(ApiError::InvalidCredentials);
    };

    if !verify_password(&state, payload.password, user.password_hash.clone()).await? {
        warn!("Failed login attempt (bad password): {}", payload.username);
        return Err(ApiError::InvalidCredentials);
    }

    let token = state.jwt.issue(&user).map_err(|e| {
        error!("{:#}", e);
        ApiError::InternalError
    })?;

    info!(user_id = user.id, is_admin = user.is_admin, "Login successful: {}", user.username);

    Ok(Json(LoginResponse {
        token,
        user_id: user.id,
        name: user.name,
        is_admin: user.is_admin,
    }))
}
