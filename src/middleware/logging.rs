//! Request logging middleware.
//!
//! One line per request: method, path, status, latency and, once the auth
//! layer has run, the calling user's id.

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::{field, info, warn, Instrument};

/// Name of the span field the auth layer fills in.
pub const USER_ID_FIELD: &str = "user_id";

/// Wrap the request in an `http_request` span and log its outcome.
///
/// Health probes pass through untraced.
pub async fn request_logging(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    if path == "/health" {
        return next.run(request).await;
    }

    let span = tracing::info_span!(
        "http_request",
        method = %method,
        path = %path,
        user_id = field::Empty,
    );
    let start = Instant::now();

    let response = next.run(request).instrument(span.clone()).await;

    let latency_ms = start.elapsed().as_millis() as u64;
    let status = response.status();

    span.in_scope(|| {
        if status.is_server_error() {
            warn!(status = status.as_u16(), latency_ms, "Request failed (5xx)");
        } else {
            info!(status = status.as_u16(), latency_ms, "Request completed");
        }
    });

    response
}
