//! HTTP router assembly.
//!
//! Three route groups:
//! - public routes: health, docs, and the AI endpoints (identified but
//!   never rejected by the optional API key)
//! - portal routes behind the session-auth middleware
//! - layers applied to everything: request tracing and permissive CORS
//!   (the portal and widget are served from other origins)

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers;
use crate::state::AppState;

/// Build the application router for the given state.
pub fn router(state: AppState) -> Router {
    // Portal routes require a valid session token
    let portal_routes = Router::new()
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route("/api/auth/me", get(handlers::auth::me))
        .route("/api/keys", post(handlers::keys::request_api_key))
        .route("/api/admin/users", get(handlers::admin::list_users))
        .route("/api/admin/keys", put(handlers::admin::update_key_status))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            crate::middleware::auth::session_auth,
        ));

    Router::new()
        // Public routes (no authentication required)
        .route("/health", get(handlers::health::health_check))
        .route("/api", get(handlers::docs::api_docs))
        .route("/api/chat", post(handlers::chat::chat))
        .route("/api/analyze", post(handlers::analyze::analyze))
        .route("/api/analyze/upload", post(handlers::analyze::analyze_upload))
        .route("/api/generate-pdf", post(handlers::pdf::generate_pdf))
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .merge(portal_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
