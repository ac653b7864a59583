//! In-memory user store.
//!
//! The fallback backend when no database is configured: a map of users plus
//! a map of live sessions, seeded with a default admin account on
//! construction. State is lost on restart, which is acceptable for the
//! local/demo mode this backend exists for.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::user::{ApiKey, ApiKeyStatus, NewUser, Role, User};

use super::{DEFAULT_ADMIN_EMAIL, UserStore, generate_api_key, generate_session_token, hash_token};

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    /// lowercased email -> user id
    emails: HashMap<String, Uuid>,
    /// hashed session token -> user id
    sessions: HashMap<String, Uuid>,
}

/// Thread-safe in-memory backend behind a single RwLock.
///
/// All operations are short map lookups, so one lock is enough; there is no
/// cross-request coordination beyond it.
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// Create a store seeded with the default admin account.
    pub fn new() -> Self {
        let mut inner = Inner::default();

        let admin = User {
            id: Uuid::new_v4(),
            name: "Super Admin".to_string(),
            email: DEFAULT_ADMIN_EMAIL.to_string(),
            company: "Finance Guru HQ".to_string(),
            location: "New York, USA".to_string(),
            phone: "+1 555 0199".to_string(),
            role: Role::Admin,
            api_keys: Vec::new(),
            created_at: Utc::now(),
        };
        inner.emails.insert(admin.email.clone(), admin.id);
        inner.users.insert(admin.id, admin);

        Self {
            inner: RwLock::new(inner),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn register(&self, new_user: NewUser) -> Result<User, AppError> {
        let mut inner = self.inner.write().await;

        let email = new_user.email.trim().to_lowercase();
        if inner.emails.contains_key(&email) {
            return Err(AppError::UserExists);
        }

        let user = User {
            id: Uuid::new_v4(),
            name: new_user.name,
            email,
            company: new_user.company,
            location: new_user.location,
            phone: new_user.phone,
            role: Role::Developer,
            api_keys: Vec::new(),
            created_at: Utc::now(),
        };

        inner.emails.insert(user.email.clone(), user.id);
        inner.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn login(&self, email: &str) -> Result<(User, String), AppError> {
        let mut inner = self.inner.write().await;

        let user_id = *inner
            .emails
            .get(&email.trim().to_lowercase())
            .ok_or(AppError::UserNotFound)?;
        let user = inner.users[&user_id].clone();

        let token = generate_session_token();
        inner.sessions.insert(hash_token(&token), user_id);

        Ok((user, token))
    }

    async fn logout(&self, token: &str) -> Result<(), AppError> {
        let mut inner = self.inner.write().await;
        inner.sessions.remove(&hash_token(token));
        Ok(())
    }

    async fn user_by_session(&self, token: &str) -> Result<Option<User>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner
            .sessions
            .get(&hash_token(token))
            .and_then(|id| inner.users.get(id))
            .cloned())
    }

    async fn request_api_key(&self, user_id: Uuid) -> Result<ApiKey, AppError> {
        let mut inner = self.inner.write().await;

        let user = inner.users.get_mut(&user_id).ok_or(AppError::UserNotFound)?;

        let key = ApiKey {
            key: generate_api_key(),
            status: ApiKeyStatus::Pending,
            requested_at: Utc::now(),
        };
        user.api_keys.push(key.clone());

        Ok(key)
    }

    async fn all_users(&self) -> Result<Vec<User>, AppError> {
        let inner = self.inner.read().await;
        let mut users: Vec<User> = inner.users.values().cloned().collect();
        users.sort_by_key(|u| u.created_at);
        Ok(users)
    }

    async fn update_api_key_status(
        &self,
        user_id: Uuid,
        key: &str,
        status: ApiKeyStatus,
    ) -> Result<(User, ApiKey), AppError> {
        let mut inner = self.inner.write().await;

        let user = inner.users.get_mut(&user_id).ok_or(AppError::UserNotFound)?;
        let record = user
            .api_keys
            .iter_mut()
            .find(|k| k.key == key)
            .ok_or(AppError::ApiKeyNotFound)?;

        if !record.status.can_transition_to(status) {
            return Err(AppError::InvalidKeyTransition {
                from: record.status,
                to: status,
            });
        }
        record.status = status;

        let updated = record.clone();
        Ok((user.clone(), updated))
    }

    async fn user_by_api_key(&self, key: &str) -> Result<Option<User>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .values()
            .find(|u| u.api_keys.iter().any(|k| k.key == key))
            .cloned())
    }
}
