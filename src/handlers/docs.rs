//! Self-describing API documentation endpoint.
//!
//! `GET /api` returns a machine-readable summary of the public surface so
//! integrators can discover endpoints without leaving the API.

use axum::Json;
use serde_json::{Value, json};

/// API documentation handler.
pub async fn api_docs() -> Json<Value> {
    Json(json!({
        "name": "Finance Guru API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "AI-powered financial analysis: chat with a financial analyst, generate reports with chart data from uploaded documents, and export branded PDFs.",
        "authentication": {
            "portal": "Bearer session token from POST /api/auth/login",
            "api": "Optional Bearer developer API key; requests without one are rate limited per client address"
        },
        "rate_limit": "Report generation is limited per identifier with a sliding window (default 10 requests / 10 seconds)",
        "endpoints": [
            { "method": "GET",  "path": "/health", "description": "Service health" },
            { "method": "GET",  "path": "/api", "description": "This document" },
            { "method": "POST", "path": "/api/chat", "description": "Chat with the Finance Guru analyst", "body": { "message": "string (required)", "history": "[{role, content}] (optional)" } },
            { "method": "POST", "path": "/api/analyze", "description": "Generate a financial report from raw text", "body": { "content": "string (required)" } },
            { "method": "POST", "path": "/api/analyze/upload", "description": "Generate a financial report from an uploaded file (xlsx, xls, pdf, csv, txt, json, md)", "body": "multipart/form-data with one file field" },
            { "method": "POST", "path": "/api/generate-pdf", "description": "Render HTML or markdown to a branded PDF", "body": { "html": "string (either)", "markdown": "string (or)" } },
            { "method": "POST", "path": "/api/auth/register", "description": "Create a developer account" },
            { "method": "POST", "path": "/api/auth/login", "description": "Start a session" },
            { "method": "POST", "path": "/api/auth/logout", "description": "End the current session", "auth": "session" },
            { "method": "GET",  "path": "/api/auth/me", "description": "Current user profile and keys", "auth": "session" },
            { "method": "POST", "path": "/api/keys", "description": "Request a new API key (starts pending)", "auth": "session" },
            { "method": "GET",  "path": "/api/admin/users", "description": "List all users", "auth": "admin session" },
            { "method": "PUT",  "path": "/api/admin/keys", "description": "Approve or revoke an API key", "auth": "admin session" }
        ]
    }))
}
