//! Admin actions: user listing and API key approval/revocation.
//!
//! Every handler here re-checks the admin role on the authenticated user;
//! the session middleware only guarantees a valid session.

use axum::{Extension, Json, extract::State};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::auth::CurrentUser;
use crate::models::user::{ApiKey, ApiKeyStatus, Role, User};
use crate::state::AppState;

fn require_admin(user: &User) -> Result<(), AppError> {
    if user.role != Role::Admin {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

/// Request body for `PUT /api/admin/keys`.
///
/// Only `active` and `revoked` are reachable from here; keys are born
/// `pending` and the store rejects backwards transitions.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateKeyRequest {
    pub user_id: Uuid,
    pub key: String,
    pub status: ApiKeyStatus,
}

/// List all registered users with their keys.
pub async fn list_users(
    State(state): State<AppState>,
    Extension(CurrentUser(admin)): Extension<CurrentUser>,
) -> Result<Json<Vec<User>>, AppError> {
    require_admin(&admin)?;
    Ok(Json(state.store.all_users().await?))
}

/// Approve or revoke a developer API key.
///
/// On approval the owner is notified by email (best-effort; delivery
/// failures are logged, never surfaced).
pub async fn update_key_status(
    State(state): State<AppState>,
    Extension(CurrentUser(admin)): Extension<CurrentUser>,
    Json(request): Json<UpdateKeyRequest>,
) -> Result<Json<ApiKey>, AppError> {
    require_admin(&admin)?;

    if request.status == ApiKeyStatus::Pending {
        return Err(AppError::InvalidRequest(
            "keys cannot be set back to pending".to_string(),
        ));
    }

    let (owner, key) = state
        .store
        .update_api_key_status(request.user_id, &request.key, request.status)
        .await?;
    tracing::info!(
        admin_id = %admin.id,
        user_id = %owner.id,
        status = %key.status,
        "API key status updated"
    );

    if key.status == ApiKeyStatus::Active {
        state
            .mailer
            .send_key_approved(&owner.email, &owner.name, &key.key)
            .await;
    }

    Ok(Json(key))
}
