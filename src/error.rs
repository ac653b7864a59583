//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.
//!
//! No error here is fatal to the process: every path produces a response the
//! caller can display, never a crash.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::models::user::ApiKeyStatus;

/// Application-wide error type.
///
/// # Error Categories
///
/// - **Input errors**: empty or unreadable files, unsupported formats,
///   invalid request bodies
/// - **Auth errors**: duplicate registration, unknown users, bad tokens,
///   non-admin access to privileged routes
/// - **Rate limiting**: sliding-window denial with a wait-and-retry hint
/// - **Upstream AI errors**: API failure or schema-violating output, never
///   retried automatically
/// - **Rendering errors**: headless-browser PDF failures
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed (e.g., connection error, query error).
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Session token is missing, invalid, or expired.
    ///
    /// Returns HTTP 401 Unauthorized.
    #[error("Invalid session token")]
    InvalidSessionToken,

    /// Authenticated user lacks the admin role required by the route.
    ///
    /// Returns HTTP 403 Forbidden.
    #[error("Admin access required")]
    Forbidden,

    /// Registration attempted with an email that is already taken.
    ///
    /// Returns HTTP 409 Conflict.
    #[error("User already exists")]
    UserExists,

    /// Login or lookup for an email/id with no matching user.
    ///
    /// Returns HTTP 404 Not Found.
    #[error("User not found. Please register.")]
    UserNotFound,

    /// Referenced API key does not exist for the given user.
    ///
    /// Returns HTTP 404 Not Found.
    #[error("API key not found")]
    ApiKeyNotFound,

    /// API key status change that violates the pending -> active -> revoked
    /// lifecycle (revoked keys never come back).
    ///
    /// Returns HTTP 422 Unprocessable Entity.
    #[error("Invalid API key status transition: {from} -> {to}")]
    InvalidKeyTransition { from: ApiKeyStatus, to: ApiKeyStatus },

    /// Sliding-window rate limit denied the request.
    ///
    /// Returns HTTP 429 Too Many Requests.
    #[error(
        "Rate limit exceeded. You are making too many requests. Please wait {retry_after_secs} seconds before trying again."
    )]
    RateLimited { retry_after_secs: u64 },

    /// Uploaded document produced no text after extraction and trimming.
    ///
    /// Returns HTTP 400 Bad Request. Raised before any AI call is made.
    #[error("The uploaded file is empty or could not be read.")]
    EmptyFile,

    /// File extension is outside the supported format set.
    ///
    /// Returns HTTP 400 Bad Request.
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// The generative-AI API key is not configured.
    ///
    /// Returns HTTP 503 Service Unavailable.
    #[error("AI service is not configured")]
    AiUnconfigured,

    /// The generative-AI API call itself failed.
    ///
    /// Returns HTTP 500 with a detail string; not retried.
    #[error("AI service error: {0}")]
    AiUpstream(String),

    /// The AI returned non-JSON or schema-violating output.
    ///
    /// Returns HTTP 500; not retried.
    #[error("The AI returned an invalid data format: {0}")]
    MalformedAiResponse(String),

    /// Headless-browser PDF rendering failed.
    ///
    /// Returns HTTP 500 with a detail string.
    #[error("Failed to generate PDF: {0}")]
    PdfRender(String),

    /// Request body or parameters are invalid.
    ///
    /// Returns HTTP 400 Bad Request.
    #[error("Invalid request")]
    InvalidRequest(String),
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// All errors return JSON in this format:
/// ```json
/// {
///   "error": {
///     "code": "error_type",
///     "message": "Human-readable error message"
///   }
/// }
/// ```
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Map each error variant to (HTTP status, error code, message)
        let (status, code, message) = match self {
            AppError::InvalidSessionToken => (
                StatusCode::UNAUTHORIZED,
                "invalid_session_token",
                self.to_string(),
            ),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "admin_only", self.to_string()),
            AppError::UserExists => (StatusCode::CONFLICT, "user_exists", self.to_string()),
            AppError::UserNotFound => (StatusCode::NOT_FOUND, "user_not_found", self.to_string()),
            AppError::ApiKeyNotFound => {
                (StatusCode::NOT_FOUND, "api_key_not_found", self.to_string())
            }
            AppError::InvalidKeyTransition { .. } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "invalid_key_transition",
                self.to_string(),
            ),
            AppError::RateLimited { .. } => (
                StatusCode::TOO_MANY_REQUESTS,
                "rate_limited",
                self.to_string(),
            ),
            AppError::EmptyFile => (StatusCode::BAD_REQUEST, "empty_file", self.to_string()),
            AppError::UnsupportedFormat(_) => (
                StatusCode::BAD_REQUEST,
                "unsupported_format",
                self.to_string(),
            ),
            AppError::AiUnconfigured => (
                StatusCode::SERVICE_UNAVAILABLE,
                "ai_unconfigured",
                self.to_string(),
            ),
            AppError::AiUpstream(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "ai_upstream_error",
                self.to_string(),
            ),
            AppError::MalformedAiResponse(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "malformed_ai_response",
                self.to_string(),
            ),
            AppError::PdfRender(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "pdf_render_failed",
                self.to_string(),
            ),
            AppError::InvalidRequest(ref msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", msg.clone())
            }
            AppError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                // Hide database details from clients
                "An internal error occurred".to_string(),
            ),
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limited_maps_to_429_with_wait_hint() {
        let err = AppError::RateLimited {
            retry_after_secs: 10,
        };
        assert!(err.to_string().contains("wait 10 seconds"));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn database_errors_hide_details() {
        let err = AppError::Database(sqlx::Error::PoolClosed);
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn key_transition_error_names_both_states() {
        let err = AppError::InvalidKeyTransition {
            from: ApiKeyStatus::Revoked,
            to: ApiKeyStatus::Active,
        };
        assert_eq!(
            err.to_string(),
            "Invalid API key status transition: revoked -> active"
        );
    }
}
