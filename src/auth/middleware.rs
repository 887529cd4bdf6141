//! Authentication Middleware
//! Mission: Protect API endpoints with JWT validation

use crate::api::AppState;
use crate::middleware::logging::USER_ID_FIELD;
use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use tracing::{debug, error, Span};

/// Auth middleware that validates JWT tokens
///
/// On success the caller's [`Identity`](crate::auth::Identity) is stored in the request extensions
/// for handlers to pick up with `Extension<Identity>`, and the user id is
/// recorded on the request span.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let bearer = match req.headers().typed_get::<Authorization<Bearer>>() {
        Some(Authorization(bearer)) => bearer,
        None if req.headers().contains_key(AUTHORIZATION) => return Err(AuthError::InvalidFormat),
        None => return Err(AuthError::MissingToken),
    };

    let identity = state
        .jwt
        .verify(bearer.token())
        .map_err(|_| AuthError::InvalidToken)?;

    // Tokens outlive deleted accounts; refuse them once the subject is gone.
    let exists = state
        .store
        .get_user(identity.user_id)
        .map_err(|e| {
            error!("Failed to resolve token subject {}: {}", identity.user_id, e);
            AuthError::Internal
        })?
        .is_some();
    if !exists {
        debug!("Token subject {} no longer exists", identity.user_id);
        return Err(AuthError::UnknownSubject);
    }

    Span::current().record(USER_ID_FIELD, identity.user_id);
    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}

/// Auth error types
#[derive(Debug)]
pub enum AuthError {
    MissingToken,
    InvalidFormat,
    InvalidToken,
    UnknownSubject,
    Internal,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingToken => (StatusCode::UNAUTHORIZED, "Missing authorization token"),
            AuthError::InvalidFormat => (
                StatusCode::UNAUTHORIZED,
                "Invalid authorization format. Use: Bearer {token}",
            ),
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid or expired token"),
            AuthError::UnknownSubject => (StatusCode::UNAUTHORIZED, "Token subject no longer exists"),
            AuthError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
        };

        (status, message).into_response()
    }
}
