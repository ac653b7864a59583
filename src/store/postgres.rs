//! PostgreSQL user store.
//!
//! The hosted backend: `profiles`, `api_keys`, and `sessions` tables created
//! by the migrations in `migrations/`. Role and key status are stored as
//! text with CHECK constraints; lifecycle transitions are still validated in
//! code so both backends reject the same operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::db::DbPool;
use crate::error::AppError;
use crate::models::user::{ApiKey, ApiKeyStatus, NewUser, Role, User};

use super::{UserStore, generate_api_key, generate_session_token, hash_token};

/// Row of the `profiles` table.
#[derive(Debug, sqlx::FromRow)]
struct ProfileRow {
    id: Uuid,
    name: String,
    email: String,
    company: String,
    location: String,
    phone: String,
    role: String,
    created_at: DateTime<Utc>,
}

/// Row of the `api_keys` table.
#[derive(Debug, sqlx::FromRow)]
struct ApiKeyRow {
    key: String,
    status: String,
    requested_at: DateTime<Utc>,
}

fn decode_role(role: &str) -> Result<Role, AppError> {
    Role::parse(role).ok_or_else(|| {
        AppError::Database(sqlx::Error::Decode(format!("unknown role: {role}").into()))
    })
}

fn decode_status(status: &str) -> Result<ApiKeyStatus, AppError> {
    ApiKeyStatus::parse(status).ok_or_else(|| {
        AppError::Database(sqlx::Error::Decode(
            format!("unknown key status: {status}").into(),
        ))
    })
}

fn decode_key(row: ApiKeyRow) -> Result<ApiKey, AppError> {
    Ok(ApiKey {
        status: decode_status(&row.status)?,
        key: row.key,
        requested_at: row.requested_at,
    })
}

/// PostgreSQL-backed implementation of [`UserStore`].
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Assemble a full `User` (profile plus keys) from its profile row.
    async fn hydrate(&self, profile: ProfileRow) -> Result<User, AppError> {
        let key_rows = sqlx::query_as::<_, ApiKeyRow>(
            "SELECT key, status, requested_at FROM api_keys WHERE user_id = $1 ORDER BY requested_at",
        )
        .bind(profile.id)
        .fetch_all(&self.pool)
        .await?;

        let api_keys = key_rows
            .into_iter()
            .map(decode_key)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(User {
            id: profile.id,
            name: profile.name,
            email: profile.email,
            company: profile.company,
            location: profile.location,
            phone: profile.phone,
            role: decode_role(&profile.role)?,
            api_keys,
            created_at: profile.created_at,
        })
    }

    async fn profile_by_id(&self, user_id: Uuid) -> Result<Option<ProfileRow>, AppError> {
        Ok(sqlx::query_as::<_, ProfileRow>(
            "SELECT id, name, email, company, location, phone, role, created_at
             FROM profiles WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?)
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn register(&self, new_user: NewUser) -> Result<User, AppError> {
        let email = new_user.email.trim().to_lowercase();

        let taken: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM profiles WHERE email = $1)")
                .bind(&email)
                .fetch_one(&self.pool)
                .await?;
        if taken {
            return Err(AppError::UserExists);
        }

        let profile = sqlx::query_as::<_, ProfileRow>(
            r#"
            INSERT INTO profiles (name, email, company, location, phone, role)
            VALUES ($1, $2, $3, $4, $5, 'developer')
            RETURNING id, name, email, company, location, phone, role, created_at
            "#,
        )
        .bind(&new_user.name)
        .bind(&email)
        .bind(&new_user.company)
        .bind(&new_user.location)
        .bind(&new_user.phone)
        .fetch_one(&self.pool)
        .await?;

        self.hydrate(profile).await
    }

    async fn login(&self, email: &str) -> Result<(User, String), AppError> {
        let profile = sqlx::query_as::<_, ProfileRow>(
            "SELECT id, name, email, company, location, phone, role, created_at
             FROM profiles WHERE email = $1",
        )
        .bind(email.trim().to_lowercase())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::UserNotFound)?;

        let token = generate_session_token();
        sqlx::query("INSERT INTO sessions (token_hash, user_id) VALUES ($1, $2)")
            .bind(hash_token(&token))
            .bind(profile.id)
            .execute(&self.pool)
            .await?;

        Ok((self.hydrate(profile).await?, token))
    }

    async fn logout(&self, token: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM sessions WHERE token_hash = $1")
            .bind(hash_token(token))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn user_by_session(&self, token: &str) -> Result<Option<User>, AppError> {
        let profile = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT p.id, p.name, p.email, p.company, p.location, p.phone, p.role, p.created_at
            FROM sessions s
            JOIN profiles p ON p.id = s.user_id
            WHERE s.token_hash = $1
            "#,
        )
        .bind(hash_token(token))
        .fetch_optional(&self.pool)
        .await?;

        match profile {
            Some(profile) => Ok(Some(self.hydrate(profile).await?)),
            None => Ok(None),
        }
    }

    async fn request_api_key(&self, user_id: Uuid) -> Result<ApiKey, AppError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM profiles WHERE id = $1)")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;
        if !exists {
            return Err(AppError::UserNotFound);
        }

        let row = sqlx::query_as::<_, ApiKeyRow>(
            r#"
            INSERT INTO api_keys (user_id, key, status)
            VALUES ($1, $2, 'pending')
            RETURNING key, status, requested_at
            "#,
        )
        .bind(user_id)
        .bind(generate_api_key())
        .fetch_one(&self.pool)
        .await?;

        decode_key(row)
    }

    async fn all_users(&self) -> Result<Vec<User>, AppError> {
        let profiles = sqlx::query_as::<_, ProfileRow>(
            "SELECT id, name, email, company, location, phone, role, created_at
             FROM profiles ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut users = Vec::with_capacity(profiles.len());
        for profile in profiles {
            users.push(self.hydrate(profile).await?);
        }
        Ok(users)
    }

    async fn update_api_key_status(
        &self,
        user_id: Uuid,
        key: &str,
        status: ApiKeyStatus,
    ) -> Result<(User, ApiKey), AppError> {
        let mut tx = self.pool.begin().await?;

        // Lock the key row so concurrent admin actions serialize
        let current: Option<String> = sqlx::query_scalar(
            "SELECT status FROM api_keys WHERE user_id = $1 AND key = $2 FOR UPDATE",
        )
        .bind(user_id)
        .bind(key)
        .fetch_optional(&mut *tx)
        .await?;

        let current = decode_status(&current.ok_or(AppError::ApiKeyNotFound)?)?;
        if !current.can_transition_to(status) {
            return Err(AppError::InvalidKeyTransition {
                from: current,
                to: status,
            });
        }

        let row = sqlx::query_as::<_, ApiKeyRow>(
            r#"
            UPDATE api_keys SET status = $1
            WHERE user_id = $2 AND key = $3
            RETURNING key, status, requested_at
            "#,
        )
        .bind(status.as_str())
        .bind(user_id)
        .bind(key)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        let profile = self.profile_by_id(user_id).await?.ok_or(AppError::UserNotFound)?;
        Ok((self.hydrate(profile).await?, decode_key(row)?))
    }

    async fn user_by_api_key(&self, key: &str) -> Result<Option<User>, AppError> {
        let profile = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT p.id, p.name, p.email, p.company, p.location, p.phone, p.role, p.created_at
            FROM api_keys k
            JOIN profiles p ON p.id = k.user_id
            WHERE k.key = $1
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        match profile {
            Some(profile) => Ok(Some(self.hydrate(profile).await?)),
            None => Ok(None),
        }
    }
}
