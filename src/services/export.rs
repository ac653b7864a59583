//! Report rendering and PDF export.
//!
//! Markdown reports are rendered to styled, branded HTML (tables enabled)
//! with a watermark overlay, then rasterized to PDF by a headless Chromium
//! instance. One browser is launched and closed per request; there is no
//! pooling, so concurrent exports scale linearly with browser spawns.

use base64::{Engine, engine::general_purpose::STANDARD};
use headless_chrome::types::PrintToPdfOptions;
use headless_chrome::{Browser, LaunchOptions};
use pulldown_cmark::{Options, Parser, html};

use crate::error::AppError;

/// Render markdown to an HTML fragment with table support.
pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let parser = Parser::new_ext(markdown, options);
    let mut out = String::new();
    html::push_html(&mut out, parser);
    out
}

/// Wrap report body HTML in the branded page template.
///
/// The template carries the Finance Guru header, the table/heading styles
/// the client applies before export, and a faint diagonal watermark.
pub fn wrap_report_html(body_html: &str) -> String {
    let generated = chrono::Utc::now().format("%Y-%m-%d");
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<style>
  body {{
    padding: 40px;
    font-family: 'Segoe UI', system-ui, sans-serif;
    font-size: 11pt;
    line-height: 1.6;
    max-width: 800px;
    background: white;
    color: #1e293b;
  }}
  h1, h2, h3 {{ color: #1e293b; margin-top: 24px; }}
  table {{ width: 100%; border-collapse: collapse; margin-top: 16px; }}
  th, td {{ border: 1px solid #e2e8f0; padding: 8px 12px; text-align: left; }}
  th {{ background-color: #f1f5f9; font-weight: 600; }}
  .fg-header {{
    display: flex; align-items: center; gap: 12px;
    margin-bottom: 24px; padding-bottom: 16px;
    border-bottom: 2px solid #6366f1;
  }}
  .fg-badge {{
    width: 40px; height: 40px;
    background: linear-gradient(135deg, #6366f1, #a855f7);
    border-radius: 8px; color: white; font-weight: bold; font-size: 18px;
    display: flex; align-items: center; justify-content: center;
  }}
  .fg-meta {{ margin-left: auto; font-size: 10px; color: #94a3b8; }}
  .fg-watermark {{
    position: fixed; top: 40%; left: 10%;
    font-size: 72px; color: rgba(100, 116, 139, 0.08);
    transform: rotate(-30deg); pointer-events: none;
  }}
</style>
</head>
<body>
  <div class="fg-watermark">Finance Guru</div>
  <div class="fg-header">
    <div class="fg-badge">FG</div>
    <div>
      <div style="font-size: 18px; font-weight: bold;">Finance Guru</div>
      <div style="font-size: 11px; color: #64748b;">AI Financial Analysis Report</div>
    </div>
    <div class="fg-meta">Generated: {generated}</div>
  </div>
  {body_html}
</body>
</html>"#
    )
}

/// Rasterize an HTML document to PDF bytes.
///
/// Launches a fresh headless browser, loads the markup via a data URL, and
/// prints to A4 with backgrounds and 20 mm margins. The browser process is
/// torn down when the handle drops, even on error.
///
/// This call is blocking (the browser protocol client is synchronous); run
/// it through [`html_to_pdf`] from async contexts.
pub fn render_pdf(html: &str, chrome_path: Option<&str>) -> Result<Vec<u8>, AppError> {
    let mut builder = LaunchOptions::default_builder();
    builder.headless(true).sandbox(false);
    if let Some(path) = chrome_path {
        builder.path(Some(path.into()));
    }
    let launch_options = builder
        .build()
        .map_err(|e| AppError::PdfRender(e.to_string()))?;

    let browser = Browser::new(launch_options).map_err(|e| AppError::PdfRender(e.to_string()))?;
    let tab = browser
        .new_tab()
        .map_err(|e| AppError::PdfRender(e.to_string()))?;

    let data_url = format!("data:text/html;base64,{}", STANDARD.encode(html));
    tab.navigate_to(&data_url)
        .and_then(|tab| tab.wait_until_navigated())
        .map_err(|e| AppError::PdfRender(e.to_string()))?;

    // A4 with 20mm margins, dimensions in inches
    let pdf_options = PrintToPdfOptions {
        print_background: Some(true),
        paper_width: Some(8.27),
        paper_height: Some(11.69),
        margin_top: Some(0.79),
        margin_bottom: Some(0.79),
        margin_left: Some(0.79),
        margin_right: Some(0.79),
        ..Default::default()
    };

    tab.print_to_pdf(Some(pdf_options))
        .map_err(|e| AppError::PdfRender(e.to_string()))
}

/// Async wrapper around [`render_pdf`] for handler use.
pub async fn html_to_pdf(html: String, chrome_path: Option<String>) -> Result<Vec<u8>, AppError> {
    tokio::task::spawn_blocking(move || render_pdf(&html, chrome_path.as_deref()))
        .await
        .map_err(|e| AppError::PdfRender(format!("render task failed: {e}")))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markdown_tables_render_as_html_tables() {
        let markdown = "\
| Category | Amount |
|----------|--------|
| Rent     | 1200   |
";
        let html = markdown_to_html(markdown);
        assert!(html.contains("<table>"));
        assert!(html.contains("<td>1200</td>"));
    }

    #[test]
    fn headings_and_emphasis_render() {
        let html = markdown_to_html("# Executive Summary\n\nNet profit **doubled**.");
        assert!(html.contains("<h1>Executive Summary</h1>"));
        assert!(html.contains("<strong>doubled</strong>"));
    }

    #[test]
    fn report_template_carries_branding_and_watermark() {
        let page = wrap_report_html("<p>body</p>");
        assert!(page.contains("Finance Guru"));
        assert!(page.contains("fg-watermark"));
        assert!(page.contains("<p>body</p>"));
    }
}
