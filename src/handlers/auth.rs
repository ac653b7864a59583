//! Registration, login, and session endpoints.
//!
//! Login is by email only (there is no password in the data model) and
//! returns an opaque session token the portal sends back as a bearer
//! credential. Responses reuse the camelCase `User` serialization.

use axum::{Extension, Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::middleware::auth::{CurrentUser, bearer_token};
use crate::models::user::{NewUser, User};
use crate::state::AppState;

/// Request body for `POST /api/auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
}

/// Response for a successful login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// Opaque session token; send as `Authorization: Bearer <token>`
    pub token: String,
    pub user: User,
}

/// Create a developer account.
///
/// # Response (201)
///
/// The created user. Registering an email that already exists fails with
/// HTTP 409 `user_exists`.
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<NewUser>,
) -> Result<(StatusCode, Json<User>), AppError> {
    if request.email.trim().is_empty() {
        return Err(AppError::InvalidRequest("email is required".to_string()));
    }
    if request.name.trim().is_empty() {
        return Err(AppError::InvalidRequest("name is required".to_string()));
    }

    let user = state.store.register(request).await?;
    tracing::info!(user_id = %user.id, "user registered");
    Ok((StatusCode::CREATED, Json(user)))
}

/// Start a session for an existing user.
///
/// Unknown emails fail with HTTP 404 `user_not_found`.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let (user, token) = state.store.login(&request.email).await?;
    tracing::info!(user_id = %user.id, "user logged in");
    Ok(Json(LoginResponse { token, user }))
}

/// End the current session. Idempotent.
pub async fn logout(
    State(state): State<AppState>,
    headers: axum::http::HeaderMap,
) -> Result<StatusCode, AppError> {
    if let Some(token) = bearer_token(&headers) {
        state.store.logout(token).await?;
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Current user profile, resolved from the session middleware.
pub async fn me(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<User> {
    Json(user)
}
