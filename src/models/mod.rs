//! Data models shared across handlers, services, and stores.

/// Chat conversation types
pub mod chat;
/// Financial report and chart payloads
pub mod report;
/// User accounts, roles, and API keys
pub mod user;
