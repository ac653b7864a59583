//! Document ingestion: extract analyzable text from an uploaded file.
//!
//! Format dispatch is an enum match over a closed set of supported formats,
//! keyed by file extension. The binary format decoding itself is delegated
//! to `calamine` (spreadsheets) and `pdf-extract` (PDFs); everything listed
//! as a text format is read as UTF-8. Unsupported extensions are rejected
//! explicitly rather than guessed at.

use std::io::Cursor;

use calamine::{Data, Reader, open_workbook_auto_from_rs};

use crate::error::AppError;

/// Supported upload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// Excel workbooks (`.xlsx`, `.xls`); the first sheet becomes CSV text
    Spreadsheet,
    /// PDF documents; per-page text joined with blank-line separators
    Pdf,
    /// Plain-text formats (`.csv`, `.txt`, `.json`, `.md`, `.text`)
    Text,
}

impl DocumentFormat {
    /// Dispatch on the lowercased file extension.
    ///
    /// # Errors
    ///
    /// `UnsupportedFormat` for extensions outside the supported set,
    /// including files with no extension at all.
    pub fn from_file_name(file_name: &str) -> Result<Self, AppError> {
        let extension = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "xlsx" | "xls" => Ok(DocumentFormat::Spreadsheet),
            "pdf" => Ok(DocumentFormat::Pdf),
            "csv" | "txt" | "json" | "md" | "text" => Ok(DocumentFormat::Text),
            _ => Err(AppError::UnsupportedFormat(file_name.to_string())),
        }
    }
}

/// Extract text content from an uploaded file.
///
/// # Errors
///
/// - `UnsupportedFormat` if the extension is outside the supported set
/// - `InvalidRequest` if the format parser rejects the bytes
/// - `EmptyFile` if the extracted content is blank after trimming; this
///   fires before any AI call is made
pub fn extract_text(file_name: &str, bytes: &[u8]) -> Result<String, AppError> {
    let content = match DocumentFormat::from_file_name(file_name)? {
        DocumentFormat::Spreadsheet => spreadsheet_to_csv(bytes)?,
        DocumentFormat::Pdf => pdf_to_text(bytes)?,
        DocumentFormat::Text => String::from_utf8(bytes.to_vec())
            .map_err(|_| AppError::InvalidRequest("file is not valid UTF-8 text".to_string()))?,
    };

    if content.trim().is_empty() {
        return Err(AppError::EmptyFile);
    }
    Ok(content)
}

/// Convert the first sheet of a workbook to CSV text.
fn spreadsheet_to_csv(bytes: &[u8]) -> Result<String, AppError> {
    let cursor = Cursor::new(bytes.to_vec());
    let mut workbook = open_workbook_auto_from_rs(cursor)
        .map_err(|e| AppError::InvalidRequest(format!("unreadable spreadsheet: {e}")))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AppError::EmptyFile)?
        .map_err(|e| AppError::InvalidRequest(format!("unreadable sheet: {e}")))?;

    let mut csv = String::new();
    for row in range.rows() {
        let line = row.iter().map(csv_field).collect::<Vec<_>>().join(",");
        csv.push_str(&line);
        csv.push('\n');
    }
    Ok(csv)
}

/// Render one cell as a CSV field, quoting when necessary.
fn csv_field(cell: &Data) -> String {
    let value = match cell {
        Data::Empty => String::new(),
        other => other.to_string(),
    };
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value
    }
}

/// Extract text from a PDF document.
fn pdf_to_text(bytes: &[u8]) -> Result<String, AppError> {
    pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| AppError::InvalidRequest(format!("unreadable PDF: {e}")))
}
