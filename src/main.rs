//! Finance Guru API - Main Application Entry Point
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Pick the user store backend (PostgreSQL if `DATABASE_URL` is set,
//!    in-memory otherwise) and run migrations when a database is used
//! 3. Build the rate limiter (Redis-backed if `REDIS_URL` is set)
//! 4. Construct the Gemini client and mailer (both optional)
//! 5. Build the HTTP router and start serving

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use finance_guru_api::services::email::Mailer;
use finance_guru_api::services::gemini::GeminiClient;
use finance_guru_api::services::rate_limit::RateLimiter;
use finance_guru_api::state::AppState;
use finance_guru_api::store::{MemoryStore, PgStore, UserStore};
use finance_guru_api::{config, db, routes};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging with tracing subscriber. Reads RUST_LOG environment variable (defaults to "info" level)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // Load configuration
    let config = config::Config::from_env()?;
    tracing::info!("Configuration loaded");

    // Pick the store backend
    let store: Arc<dyn UserStore> = match &config.database_url {
        Some(database_url) => {
            let pool = db::create_pool(database_url).await?;
            tracing::info!("Database pool created");

            db::run_migrations(&pool).await?;
            tracing::info!("Database migrations complete");

            Arc::new(PgStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using the in-memory user store");
            Arc::new(MemoryStore::new())
        }
    };

    // Build the rate limiter. A configured-but-unreachable Redis falls back
    // to the in-process window at startup; failures after startup are
    // resolved by the fail-open policy flag.
    let window = Duration::from_secs(config.rate_limit_window_secs);
    let rate_limiter = match &config.redis_url {
        Some(redis_url) => match connect_redis(redis_url).await {
            Ok(connection) => {
                tracing::info!("Rate limiter using Redis store");
                RateLimiter::with_redis(
                    connection,
                    config.rate_limit_max_requests,
                    window,
                    config.rate_limit_fail_open,
                )
            }
            Err(err) => {
                tracing::warn!(error = %err, "Redis unreachable; using in-process rate limiter");
                RateLimiter::in_memory(
                    config.rate_limit_max_requests,
                    window,
                    config.rate_limit_fail_open,
                )
            }
        },
        None => {
            tracing::warn!("REDIS_URL not set; using in-process rate limiter");
            RateLimiter::in_memory(
                config.rate_limit_max_requests,
                window,
                config.rate_limit_fail_open,
            )
        }
    };

    // The AI client is optional; without it the chat/analyze routes answer
    // with a "not configured" error instead of failing startup
    let gemini = match config.gemini_api_key.clone() {
        Some(api_key) => Some(Arc::new(GeminiClient::new(api_key)?)),
        None => {
            tracing::warn!("GEMINI_API_KEY not set; AI routes are disabled");
            None
        }
    };

    let state = AppState {
        store,
        rate_limiter: Arc::new(rate_limiter),
        gemini,
        mailer: Arc::new(Mailer::new(config.resend_api_key.clone())),
        chrome_path: config.chrome_path.clone(),
    };

    let app = routes::router(state);

    // Bind to network address and start server
    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    // Start serving HTTP requests. ConnectInfo carries the peer address
    // into the handlers for per-client rate limiting.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Open a managed Redis connection for the rate limiter.
async fn connect_redis(redis_url: &str) -> anyhow::Result<redis::aio::ConnectionManager> {
    let client = redis::Client::open(redis_url)?;
    Ok(client.get_connection_manager().await?)
}
