//! HTTP middleware components.
//!
//! Middleware are functions that run before route handlers. Here they
//! authenticate portal requests and attach the current user to the request.

/// Session-token authentication middleware
pub mod auth;
