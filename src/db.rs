//! Database connection pool and migration management.
//!
//! The database is optional: when `DATABASE_URL` is absent the application
//! runs against the in-memory user store instead (see [`crate::store`]).

use sqlx::{Pool, Postgres};

/// Type alias for PostgreSQL connection pool.
pub type DbPool = Pool<Postgres>;

/// Create a new PostgreSQL connection pool.
///
/// A connection pool maintains multiple database connections that can be
/// reused across HTTP requests, which is much more efficient than opening a
/// new connection for each request.
///
/// # Errors
///
/// Returns an error if:
/// - Database connection string is invalid
/// - Cannot connect to PostgreSQL server
/// - Database authentication fails
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    sqlx::postgres::PgPoolOptions::new()
        // Limit concurrent connections
        .max_connections(5)
        .connect(database_url)
        .await
}

/// Run database migrations from the `migrations/` directory.
///
/// Migrations are tracked in a `_sqlx_migrations` table, so each migration
/// runs only once. Files follow the `<timestamp>_<name>.sql` convention.
///
/// # Errors
///
/// Returns an error if migration files cannot be read, contain SQL syntax
/// errors, or the database rejects them.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    // The macro reads migrations at compile time from ./migrations directory
    sqlx::migrate!("./migrations").run(pool).await
}
