//! PDF export endpoint.
//!
//! Accepts either ready-made HTML or a markdown report. Markdown goes
//! through the renderer (branded template + watermark) first; HTML is
//! rasterized as-is. Returns `application/pdf` bytes with a download
//! `Content-Disposition`, the one non-JSON response in the API.

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, HeaderValue, header},
};
use serde::Deserialize;

use crate::error::AppError;
use crate::services::export;
use crate::state::AppState;

/// Request body for `POST /api/generate-pdf`.
///
/// Exactly one of `html` or `markdown` must be provided.
#[derive(Debug, Deserialize)]
pub struct GeneratePdfRequest {
    /// Pre-rendered markup to rasterize unchanged
    pub html: Option<String>,

    /// A markdown report to render through the branded template
    pub markdown: Option<String>,
}

/// Render HTML or markdown to a branded PDF and stream it back.
pub async fn generate_pdf(
    State(state): State<AppState>,
    Json(request): Json<GeneratePdfRequest>,
) -> Result<(HeaderMap, Vec<u8>), AppError> {
    let html = match (request.html, request.markdown) {
        (Some(html), _) if !html.trim().is_empty() => html,
        (_, Some(markdown)) if !markdown.trim().is_empty() => {
            export::wrap_report_html(&export::markdown_to_html(&markdown))
        }
        _ => {
            return Err(AppError::InvalidRequest(
                "HTML content is required".to_string(),
            ));
        }
    };

    let pdf = export::html_to_pdf(html, state.chrome_path.clone()).await?;
    tracing::info!(bytes = pdf.len(), "PDF generated");

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/pdf"),
    );
    let file_name = format!(
        "Finance_Guru_Report_{}.pdf",
        chrono::Utc::now().format("%Y%m%d%H%M%S")
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&format!("attachment; filename=\"{file_name}\""))
            .map_err(|e| AppError::PdfRender(e.to_string()))?,
    );

    Ok((headers, pdf))
}
