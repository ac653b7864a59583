//! Shared application state handed to every handler.

use std::sync::Arc;

use crate::services::email::Mailer;
use crate::services::gemini::GeminiClient;
use crate::services::rate_limit::RateLimiter;
use crate::store::UserStore;

/// Everything handlers need, injected via axum's `State` extractor.
///
/// The store and rate limiter are trait/enum abstractions chosen once at
/// startup; handlers never know which backend is live. `gemini` is `None`
/// when the AI key is unconfigured, in which case the chat and analyze
/// routes answer with a "not configured" error.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn UserStore>,
    pub rate_limiter: Arc<RateLimiter>,
    pub gemini: Option<Arc<GeminiClient>>,
    pub mailer: Arc<Mailer>,
    pub chrome_path: Option<String>,
}
