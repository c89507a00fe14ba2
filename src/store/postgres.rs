/// Postgres-backed stores
///
/// Refresh tokens are stored as their SHA-256 digest, so a copy of the table
/// does not hand out usable credentials. Callers never see the digest.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use uuid::Uuid;

use super::{RefreshTokenRecord, RefreshTokenStore, User, UserStore};
use crate::error::DatabaseError;

type UserRow = (Uuid, String, String, DateTime<Utc>, DateTime<Utc>);

fn into_user((id, email, hashed_password, created_at, updated_at): UserRow) -> User {
    User {
        id,
        email,
        hashed_password,
        created_at,
        updated_at,
    }
}

fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, hashed_password, created_at, updated_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(into_user))
    }

    async fn create(&self, email: &str, hashed_password: &str) -> Result<User, DatabaseError> {
        let now = Utc::now();
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, email, hashed_password, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            RETURNING id, email, hashed_password, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(hashed_password)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(into_user(row))
    }

    async fn update(
        &self,
        id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> Result<User, DatabaseError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET email = $2, hashed_password = $3, updated_at = $4
            WHERE id = $1
            RETURNING id, email, hashed_password, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(email)
        .bind(hashed_password)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        row.map(into_user)
            .ok_or_else(|| DatabaseError::NotFound(format!("user {}", id)))
    }

    async fn reset_all(&self) -> Result<(), DatabaseError> {
        sqlx::query("DELETE FROM users").execute(&self.pool).await?;
        tracing::info!("All users deleted");
        Ok(())
    }
}

#[derive(Clone)]
pub struct PgRefreshTokenStore {
    pool: PgPool,
}

impl PgRefreshTokenStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RefreshTokenStore for PgRefreshTokenStore {
    async fn insert(
        &self,
        token: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (token_hash, user_id, created_at, updated_at, expires_at)
            VALUES ($1, $2, $3, $3, $4)
            "#,
        )
        .bind(hash_token(token))
        .bind(user_id)
        .bind(now)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DatabaseError::WriteFailure(e.to_string()))?;

        Ok(())
    }

    async fn lookup(&self, token: &str) -> Result<RefreshTokenRecord, DatabaseError> {
        let row = sqlx::query_as::<_, (Uuid, DateTime<Utc>, DateTime<Utc>, Option<DateTime<Utc>>)>(
            r#"
            SELECT user_id, created_at, expires_at, revoked_at
            FROM refresh_tokens
            WHERE token_hash = $1
            "#,
        )
        .bind(hash_token(token))
        .fetch_optional(&self.pool)
        .await?;

        let (user_id, created_at, expires_at, revoked_at) =
            row.ok_or_else(|| DatabaseError::NotFound("refresh token".to_string()))?;

        Ok(RefreshTokenRecord {
            user_id,
            created_at,
            expires_at,
            revoked_at,
        })
    }

    async fn revoke(&self, token: &str) -> Result<(), DatabaseError> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked_at = COALESCE(revoked_at, $1), updated_at = $1
            WHERE token_hash = $2
            "#,
        )
        .bind(now)
        .bind(hash_token(token))
        .execute(&self.pool)
        .await
        .map_err(|e| DatabaseError::WriteFailure(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound("refresh token".to_string()));
        }

        Ok(())
    }

    async fn reset_all(&self) -> Result<(), DatabaseError> {
        sqlx::query("DELETE FROM refresh_tokens")
            .execute(&self.pool)
            .await?;
        tracing::info!("All refresh tokens deleted");
        Ok(())
    }
}
