//! HTTP handlers for the Fake News Detection API.

pub mod analyze;
pub mod status;

use crate::error::AppError;
use axum::http::StatusCode;

/// CORS preflight response, identical on every route. The CORS headers
/// themselves are attached by the response middleware.
pub async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// Fallback for requests using an unsupported method on a known route.
pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}
