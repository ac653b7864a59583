//! AI chat endpoint.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::chat::ChatTurn;
use crate::services::chat;
use crate::state::AppState;

/// Request body for `POST /api/chat`.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,

    /// Prior conversation turns; the server keeps no chat state
    #[serde(default)]
    pub history: Vec<ChatTurn>,
}

/// Response body for `POST /api/chat`.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub success: bool,
    pub reply: String,
}

/// Send a message to the Finance Guru analyst.
///
/// # Response (200)
///
/// ```json
/// {
///   "success": true,
///   "reply": "Based on your question about financial ratios..."
/// }
/// ```
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    if request.message.trim().is_empty() {
        return Err(AppError::InvalidRequest("message is required".to_string()));
    }

    let gemini = state.gemini.as_deref().ok_or(AppError::AiUnconfigured)?;
    let reply = chat::reply(gemini, &request.history, &request.message).await?;

    Ok(Json(ChatResponse {
        success: true,
        reply,
    }))
}
