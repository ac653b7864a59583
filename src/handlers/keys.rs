//! Developer API key requests.

use axum::{Extension, Json, extract::State, http::StatusCode};

use crate::error::AppError;
use crate::middleware::auth::CurrentUser;
use crate::models::user::ApiKey;
use crate::state::AppState;

/// Request a new API key for the authenticated developer.
///
/// # Response (201)
///
/// The new key, always in `pending` status. Only an admin approval action
/// can move it to `active`.
pub async fn request_api_key(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<(StatusCode, Json<ApiKey>), AppError> {
    let key = state.store.request_api_key(user.id).await?;
    tracing::info!(user_id = %user.id, "API key requested");
    Ok((StatusCode::CREATED, Json(key)))
}
