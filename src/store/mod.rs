/// Persistence contracts
///
/// The session core only talks to storage through these two traits. Each
/// method must be atomic on its own; nothing here spans several calls.

mod memory;
mod postgres;

pub use memory::{InMemoryRefreshTokenStore, InMemoryUserStore};
pub use postgres::{PgRefreshTokenStore, PgUserStore};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::DatabaseError;

/// A registered user as held by the user store
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub hashed_password: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// State of a persisted refresh token
#[derive(Debug, Clone)]
pub struct RefreshTokenRecord {
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl RefreshTokenRecord {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    /// Usable iff not expired and never revoked
    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_expired_at(now) && !self.is_revoked()
    }
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError>;

    /// Fails with `UniqueConstraintViolation` if the email is taken.
    async fn create(&self, email: &str, hashed_password: &str) -> Result<User, DatabaseError>;

    /// Fails with `NotFound` for an unknown id.
    async fn update(
        &self,
        id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> Result<User, DatabaseError>;

    async fn reset_all(&self) -> Result<(), DatabaseError>;
}

#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    async fn insert(
        &self,
        token: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<(), DatabaseError>;

    /// Fails with `NotFound` for an unknown token.
    async fn lookup(&self, token: &str) -> Result<RefreshTokenRecord, DatabaseError>;

    /// Stamp `revoked_at`. Fails with `NotFound` for an unknown token;
    /// revoking an already revoked token succeeds and keeps the first timestamp.
    async fn revoke(&self, token: &str) -> Result<(), DatabaseError>;

    async fn reset_all(&self) -> Result<(), DatabaseError>;
}
