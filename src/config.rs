//! Application configuration management.
//!
//! This module handles loading configuration from environment variables.
//! It uses the `envy` crate to automatically deserialize environment variables into a type-safe struct.
//!
//! Every integration secret is optional: the subsystem it belongs to degrades
//! to a local fallback (auth store, rate limiter) or a "not configured" error
//! (AI routes) when its variable is absent.

use serde::Deserialize;

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 3000
/// - `DATABASE_URL` (optional): PostgreSQL connection string; when absent the
///   user store runs in memory
/// - `GEMINI_API_KEY` (optional): generative-AI API key; when absent the chat
///   and analyze routes answer with a "not configured" error
/// - `REDIS_URL` (optional): rate-limit store; when absent the sliding window
///   is kept in process
/// - `RESEND_API_KEY` (optional): transactional email; when absent emails are
///   silently skipped
/// - `RATE_LIMIT_MAX_REQUESTS` (optional): requests per window, defaults to 10
/// - `RATE_LIMIT_WINDOW_SECS` (optional): window length, defaults to 10
/// - `RATE_LIMIT_FAIL_OPEN` (optional): allow requests when the rate-limit
///   store errors, defaults to true
/// - `CHROME_PATH` (optional): headless browser binary override for PDF export
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_port")]
    pub server_port: u16,

    pub database_url: Option<String>,

    pub gemini_api_key: Option<String>,

    pub redis_url: Option<String>,

    pub resend_api_key: Option<String>,

    #[serde(default = "default_rate_limit_max_requests")]
    pub rate_limit_max_requests: u32,

    #[serde(default = "default_rate_limit_window_secs")]
    pub rate_limit_window_secs: u64,

    #[serde(default = "default_fail_open")]
    pub rate_limit_fail_open: bool,

    pub chrome_path: Option<String>,
}

/// Default port if SERVER_PORT environment variable is not set.
fn default_port() -> u16 {
    3000
}

/// Default sliding-window size: 10 requests.
fn default_rate_limit_max_requests() -> u32 {
    10
}

/// Default sliding-window length: 10 seconds.
fn default_rate_limit_window_secs() -> u64 {
    10
}

/// Rate limiting prefers availability over strictness by default.
fn default_fail_open() -> bool {
    true
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// This method first attempts to load a `.env` file (which is optional),
    /// then reads environment variables and deserializes them into a Config struct.
    ///
    /// # Errors
    ///
    /// Returns an error if environment variable values cannot be parsed into
    /// expected types (e.g. a non-numeric `SERVER_PORT`).
    pub fn from_env() -> Result<Self, envy::Error> {
        // Try to load .env file if it exists (does nothing if not found)
        dotenvy::dotenv().ok();

        // Parse environment variables into Config struct
        // Field names are automatically converted: gemini_api_key -> GEMINI_API_KEY
        envy::from_env::<Config>()
    }
}
