//! Report generation endpoints.
//!
//! The pipeline per request: ingest (upload variant) -> rate-limit gate ->
//! report generator -> response. The empty-content check runs before the
//! gate so a blank upload never consumes a rate-limit slot, and the AI
//! service is never called for it.

use axum::{
    Json,
    extract::{Multipart, State},
    http::HeaderMap,
};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::middleware::auth::{ClientAddr, rate_limit_identity};
use crate::models::report::{ChartData, FinancialReport};
use crate::services::{ingest, report};
use crate::state::AppState;

/// Request body for `POST /api/analyze`.
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    /// Raw financial data: CSV rows, statement text, etc.
    pub content: String,
}

/// Response body for both analyze endpoints.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub success: bool,

    /// The generated report, formatted in markdown
    pub report: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart_data: Option<ChartData>,
}

impl From<FinancialReport> for AnalyzeResponse {
    fn from(report: FinancialReport) -> Self {
        Self {
            success: true,
            report: report.report_text,
            chart_data: report.chart_data,
        }
    }
}

/// Generate a report from raw text content.
pub async fn analyze(
    State(state): State<AppState>,
    client: ClientAddr,
    headers: HeaderMap,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    if request.content.trim().is_empty() {
        return Err(AppError::EmptyFile);
    }
    run_pipeline(&state, &headers, client, &request.content).await
}

/// Generate a report from an uploaded document.
///
/// Accepts one multipart file field; the ingestor dispatches on the file
/// extension (xlsx/xls, pdf, or a plain-text format).
pub async fn analyze_upload(
    State(state): State<AppState>,
    client: ClientAddr,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let field = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidRequest(format!("invalid multipart body: {e}")))?
        .ok_or_else(|| AppError::InvalidRequest("a file field is required".to_string()))?;

    let file_name = field
        .file_name()
        .map(ToOwned::to_owned)
        .ok_or_else(|| AppError::InvalidRequest("uploaded field has no file name".to_string()))?;
    let bytes = field
        .bytes()
        .await
        .map_err(|e| AppError::InvalidRequest(format!("failed to read upload: {e}")))?;

    let content = ingest::extract_text(&file_name, &bytes)?;
    tracing::info!(%file_name, bytes = bytes.len(), "document ingested");

    run_pipeline(&state, &headers, client, &content).await
}

/// Shared tail of both endpoints: gate, generate, respond.
async fn run_pipeline(
    state: &AppState,
    headers: &HeaderMap,
    client: ClientAddr,
    content: &str,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let identifier = rate_limit_identity(state, headers, client.0).await;
    let decision = state.rate_limiter.check(&identifier).await;
    if !decision.allowed {
        tracing::info!(%identifier, "report request rate limited");
        return Err(AppError::RateLimited {
            retry_after_secs: decision.reset_in.as_secs().max(1),
        });
    }

    let gemini = state.gemini.as_deref().ok_or(AppError::AiUnconfigured)?;
    let report = report::generate(gemini, content).await?;

    Ok(Json(report.into()))
}
