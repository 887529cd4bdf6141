//! HTTP API
//! Mission: Expose users, lists and items over JSON, guard first, store second
//!
//! # Endpoints
//!
//! - `GET /health` - Liveness probe (public)
//! - `POST /auth/login` - Exchange credentials for a bearer token (public)
//! - `/users/...` - User management (admin only)
//! - `/lists/...`, `/items/...` - Lists and items (owner or admin)

pub mod auth;
pub mod items;
pub mod lists;
pub mod users;

use crate::auth::{auth_middleware, guard::AccessError, CredentialHasher, JwtHandler};
use crate::middleware::request_logging;
use crate::store::{StoreError, TodoStore};
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, error};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<TodoStore>,
    pub jwt: Arc<JwtHandler>,
    pub hasher: Arc<dyn CredentialHasher>,
    /// Hash checked on logins for unknown usernames, built on first use.
    decoy_hash: Arc<OnceCell<String>>,
}

impl AppState {
    pub fn new(store: TodoStore, jwt: JwtHandler, hasher: impl CredentialHasher + 'static) -> Self {
        Self {
            store: Arc::new(store),
            jwt: Arc::new(jwt),
            hasher: Arc::new(hasher),
            decoy_hash: Arc::new(OnceCell::new()),
        }
    }
}

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/users", get(users::list_users).post(users::create_user))
        .route("/users/:id", put(users::edit_user).delete(users::delete_user))
        .route("/users/:id/password", put(users::update_password))
        .route("/lists", get(lists::get_lists).post(lists::create_list))
        .route("/lists/:id", put(lists::edit_list).delete(lists::delete_list))
        .route("/lists/:id/items", get(items::get_items).post(items::add_item))
        .route("/items/:id", put(items::edit_item).delete(items::delete_item))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/health", get(health_check))
        .route("/auth/login", post(auth::login))
        .merge(protected_routes)
        .layer(middleware::from_fn(request_logging))
        .with_state(state)
}

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now(),
    }))
}

/// API errors, one variant per failure class surfaced to clients.
#[derive(Debug)]
pub enum ApiError {
    /// Wrong username or password on login
    InvalidCredentials,
    Forbidden,
    NotFound(&'static str),
    BadRequest(String),
    InternalError,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Invalid username or password").into_response()
            }
            ApiError::Forbidden => {
                (StatusCode::FORBIDDEN, "Insufficient permissions").into_response()
            }
            ApiError::NotFound(what) => (StatusCode::NOT_FOUND, what).into_response(),
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message).into_response(),
            ApiError::InternalError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}

impl From<AccessError> for ApiError {
    fn from(e: AccessError) -> Self {
        match e {
            AccessError::Forbidden => ApiError::Forbidden,
            AccessError::NotFound => ApiError::NotFound("Not found"),
            AccessError::MissingReference => ApiError::BadRequest("List not found".to_string()),
        }
    }
}

/// Body rejections surface after the guard, as plain validation failures.
impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        debug!("Rejected request body: {}", e.body_text());
        ApiError::BadRequest("Invalid request body".to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateUsername(_) => {
                ApiError::BadRequest("Username already exists".to_string())
            }
            StoreError::MissingReference("owner") => {
                ApiError::BadRequest("Owner not found".to_string())
            }
            StoreError::MissingReference(_) => ApiError::BadRequest("List not found".to_string()),
            StoreError::Sqlite(e) => {
                error!("Store failure: {}", e);
                ApiError::InternalError
            }
        }
    }
}

/// Run the (deliberately slow) password hash off the async workers.
pub(crate) async fn hash_password(state: &AppState, password: String) -> Result<String, ApiError> {
    let hasher = state.hasher.clone();
    tokio::task::spawn_blocking(move || hasher.hash(&password))
        .await
        .map_err(|e| {
            error!("Hashing task failed: {}", e);
            ApiError::InternalError
        })?
        .map_err(|e| {
            error!("{:#}", e);
            ApiError::InternalError
        })
}

pub(crate) async fn verify_password(
    state: &AppState,
    password: String,
    hash: String,
) -> Result<bool, ApiError> {
    let hasher = state.hasher.clone();
    tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
        .await
        .map_err(|e| {
            error!("Verification task failed: {}", e);
            ApiError::InternalError
        })?
        .map_err(|e| {
            error!("{:#}", e);
            ApiError::InternalError
        })
}

/// Pay one verify against a throwaway hash so unknown usernames cost the
/// same as wrong passwords.
pub(crate) async fn verify_decoy(state: &AppState, password: String) -> Result<(), ApiError> {
    let hash = state
        .decoy_hash
        .get_or_try_init(|| hash_password(state, "decoy-password".to_string()))
        .await?
        .clone();
    verify_password(state, password, hash).await?;
    Ok(())
}
