//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that receives request data, calls into
//! the services/store, and returns a JSON response (or PDF bytes).

/// Admin actions: user listing and key approval
pub mod admin;
/// Report generation endpoints
pub mod analyze;
/// Registration, login, and session endpoints
pub mod auth;
/// AI chat endpoint
pub mod chat;
/// Self-describing API documentation
pub mod docs;
/// Health check endpoint
pub mod health;
/// Developer API key requests
pub mod keys;
/// PDF export endpoint
pub mod pdf;
