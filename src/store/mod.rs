//! User store with two interchangeable backends.
//!
//! The portal's accounts, API keys, and sessions live behind the
//! [`UserStore`] trait. Which backend is used is decided once at startup:
//! PostgreSQL when `DATABASE_URL` is configured, an in-memory store
//! otherwise. Handlers only ever see the trait object.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::user::{ApiKey, ApiKeyStatus, NewUser, User};

/// In-memory backend (default, also used by the test suite)
pub mod memory;
/// PostgreSQL backend
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Email of the admin account every backend is seeded with.
pub const DEFAULT_ADMIN_EMAIL: &str = "admin@financeguru.com";

/// Contract surface shared by both backends.
///
/// Invariants enforced by every implementation:
/// - registration with a taken email fails with [`AppError::UserExists`]
/// - login with an unknown email fails with [`AppError::UserNotFound`]
/// - new API keys start `pending`
/// - key status only moves pending -> active, or pending/active -> revoked
/// - users are never hard-deleted
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Create a new developer account. The role is always `developer`.
    async fn register(&self, new_user: NewUser) -> Result<User, AppError>;

    /// Start a session for an existing user, returning the user and an
    /// opaque session token. Login is by email only; there is no password
    /// in the data model.
    async fn login(&self, email: &str) -> Result<(User, String), AppError>;

    /// End the session identified by `token`. Unknown tokens are a no-op.
    async fn logout(&self, token: &str) -> Result<(), AppError>;

    /// Resolve a session token to its user, or `None` if the session does
    /// not exist.
    async fn user_by_session(&self, token: &str) -> Result<Option<User>, AppError>;

    /// Create a new `pending` API key for the user.
    async fn request_api_key(&self, user_id: Uuid) -> Result<ApiKey, AppError>;

    /// All registered users with their keys (admin view).
    async fn all_users(&self) -> Result<Vec<User>, AppError>;

    /// Admin approval/revocation action. Validates the lifecycle transition
    /// and returns the owning user and the updated key.
    async fn update_api_key_status(
        &self,
        user_id: Uuid,
        key: &str,
        status: ApiKeyStatus,
    ) -> Result<(User, ApiKey), AppError>;

    /// Resolve an API key string to its owner, regardless of key status.
    /// Callers decide whether a non-`active` key counts.
    async fn user_by_api_key(&self, key: &str) -> Result<Option<User>, AppError>;
}

/// Generate a fresh developer API key: `fg_` plus 32 hex characters.
pub(crate) fn generate_api_key() -> String {
    let bytes: [u8; 16] = rand::random();
    format!("fg_{}", hex::encode(bytes))
}

/// Generate an opaque session token (32 random bytes, hex encoded).
pub(crate) fn generate_session_token() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}

/// SHA-256 hash of a session token.
///
/// Tokens are hashed at rest so a leaked store snapshot cannot be replayed
/// as live sessions.
pub(crate) fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_keys_carry_the_fg_prefix() {
        let key = generate_api_key();
        assert!(key.starts_with("fg_"));
        assert_eq!(key.len(), 3 + 32);
    }

    #[test]
    fn token_hash_is_stable_and_hex() {
        let token = generate_session_token();
        assert_eq!(hash_token(&token), hash_token(&token));
        assert_eq!(hash_token(&token).len(), 64);
        assert_ne!(hash_token(&token), token);
    }
}
