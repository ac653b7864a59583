//! Finance Guru API - AI-powered financial analysis service.
//!
//! A REST API that lets clients chat with an LLM-backed financial analyst,
//! generate structured reports (with chart data) from uploaded financial
//! documents, export branded PDFs, and manage developer accounts and API
//! keys through a small portal surface.
//!
//! # Architecture
//!
//! - **Web framework**: Axum (async HTTP server)
//! - **Storage**: PostgreSQL via sqlx, or an in-memory store when no
//!   database is configured
//! - **AI**: Gemini `generateContent` over REST, with constrained-JSON
//!   report output
//! - **Rate limiting**: sliding window per identifier, Redis-backed when
//!   configured
//! - **Export**: markdown -> branded HTML -> PDF via headless Chromium

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
