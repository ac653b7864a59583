//! User accounts, roles, and API keys.
//!
//! These types are shared by both store backends (PostgreSQL and in-memory)
//! and by the portal handlers. API responses use camelCase field names to
//! stay wire-compatible with the existing clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role assigned to a user at registration time.
///
/// A user has exactly one role for its lifetime: everyone registers as a
/// `developer`; the seeded admin account is the only `admin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Developer,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Developer => "developer",
            Role::Admin => "admin",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "developer" => Some(Role::Developer),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// Lifecycle state of a developer API key.
///
/// Keys are created `pending` and only an admin approval action moves them
/// to `active`. Revocation is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiKeyStatus {
    Pending,
    Active,
    Revoked,
}

impl ApiKeyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiKeyStatus::Pending => "pending",
            ApiKeyStatus::Active => "active",
            ApiKeyStatus::Revoked => "revoked",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(ApiKeyStatus::Pending),
            "active" => Some(ApiKeyStatus::Active),
            "revoked" => Some(ApiKeyStatus::Revoked),
            _ => None,
        }
    }

    /// Whether a status change is permitted.
    ///
    /// Allowed: pending -> active, pending -> revoked, active -> revoked.
    /// Everything else (including revoked -> active) is rejected, so the
    /// lifecycle never runs backwards.
    pub fn can_transition_to(self, next: ApiKeyStatus) -> bool {
        matches!(
            (self, next),
            (ApiKeyStatus::Pending, ApiKeyStatus::Active)
                | (ApiKeyStatus::Pending, ApiKeyStatus::Revoked)
                | (ApiKeyStatus::Active, ApiKeyStatus::Revoked)
        )
    }
}

impl std::fmt::Display for ApiKeyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A developer API key owned by exactly one user.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKey {
    /// The key string handed to the developer (prefix `fg_`)
    pub key: String,

    /// Current lifecycle state
    pub status: ApiKeyStatus,

    /// When the developer requested this key
    pub requested_at: DateTime<Utc>,
}

/// A registered user with their API keys.
///
/// Users are created on registration, mutated by admin approval actions,
/// and never hard-deleted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub company: String,
    pub location: String,
    pub phone: String,
    pub role: Role,
    pub api_keys: Vec<ApiKey>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Look up one of this user's keys by its key string.
    pub fn api_key(&self, key: &str) -> Option<&ApiKey> {
        self.api_keys.iter().find(|k| k.key == key)
    }
}

/// Profile fields collected at registration.
///
/// Role, keys, and timestamps are assigned by the store.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub company: String,
    pub location: String,
    pub phone: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_keys_can_be_approved_or_revoked() {
        assert!(ApiKeyStatus::Pending.can_transition_to(ApiKeyStatus::Active));
        assert!(ApiKeyStatus::Pending.can_transition_to(ApiKeyStatus::Revoked));
    }

    #[test]
    fn active_keys_can_only_be_revoked() {
        assert!(ApiKeyStatus::Active.can_transition_to(ApiKeyStatus::Revoked));
        assert!(!ApiKeyStatus::Active.can_transition_to(ApiKeyStatus::Pending));
        assert!(!ApiKeyStatus::Active.can_transition_to(ApiKeyStatus::Active));
    }

    #[test]
    fn revoked_is_terminal() {
        assert!(!ApiKeyStatus::Revoked.can_transition_to(ApiKeyStatus::Active));
        assert!(!ApiKeyStatus::Revoked.can_transition_to(ApiKeyStatus::Pending));
        assert!(!ApiKeyStatus::Revoked.can_transition_to(ApiKeyStatus::Revoked));
    }

    #[test]
    fn role_round_trips_through_text() {
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse(Role::Developer.as_str()), Some(Role::Developer));
        assert_eq!(Role::parse("superuser"), None);
    }
}
