//! Thin client for the Gemini `generateContent` REST API.
//!
//! Both the chat service and the report generator go through this client.
//! It owns the HTTP plumbing (one reqwest client with a generous timeout,
//! since completions are slow) and the request/response wire types; callers
//! supply contents and a generation config.

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::chat::ChatTurn;

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Upstream completion timeout. A single report over a large document can
/// take tens of seconds.
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// One part of a content block. Only text parts are used here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    pub text: String,
}

/// A content block: an optional role plus its parts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub parts: Vec<Part>,
}

impl Content {
    /// A role-less content block, used for system instructions.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            role: None,
            parts: vec![Part { text: text.into() }],
        }
    }

    /// A content block attributed to a conversation role.
    pub fn with_role(role: &str, text: impl Into<String>) -> Self {
        Self {
            role: Some(role.to_string()),
            parts: vec![Part { text: text.into() }],
        }
    }
}

impl From<&ChatTurn> for Content {
    fn from(turn: &ChatTurn) -> Self {
        Content::with_role(turn.role.as_str(), turn.content.clone())
    }
}

/// Generation parameters. Only set fields are serialized.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,

    /// Set to `application/json` to request constrained JSON output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,

    /// Schema the model must constrain its JSON output to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: &'a [Content],

    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<&'a Content>,

    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<&'a GenerationConfig>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

/// Client for the hosted generative-AI completion API.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    /// Build a client for the given API key.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(api_key: String) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::AiUpstream(format!("HTTP client error: {e}")))?;

        Ok(Self {
            http,
            api_key,
            base_url: BASE_URL.to_string(),
        })
    }

    /// Run one completion and return the first candidate's text.
    ///
    /// # Errors
    ///
    /// - `AiUpstream` on transport failures, non-success status codes, or a
    ///   response with no candidates/text. Never retried here; callers
    ///   surface the failure to the user instead.
    pub async fn generate(
        &self,
        model: &str,
        contents: &[Content],
        system_instruction: Option<&Content>,
        config: Option<&GenerationConfig>,
    ) -> Result<String, AppError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, model);
        let request = GenerateContentRequest {
            contents,
            system_instruction,
            generation_config: config,
        };

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::AiUpstream(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            tracing::error!(%status, "generative-AI API returned an error");
            return Err(AppError::AiUpstream(format!(
                "API returned {status}: {}",
                truncate(&detail, 300)
            )));
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| AppError::AiUpstream(format!("unreadable response body: {e}")))?;

        body.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| AppError::AiUpstream("response contained no text".to_string()))
    }
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
