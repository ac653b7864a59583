//! Business logic services.
//!
//! Services contain the core logic separated from HTTP handlers: the
//! generative-AI client, the report and chat pipelines, document ingestion,
//! rate limiting, rendering/export, and outbound email.

pub mod chat;
pub mod email;
pub mod export;
pub mod gemini;
pub mod ingest;
pub mod rate_limit;
pub mod report;
