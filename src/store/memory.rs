/// In-process stores
///
/// Used by the test suites and for running the service without Postgres.
/// Every operation is a single critical section.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::{RefreshTokenRecord, RefreshTokenStore, User, UserStore};
use crate::error::DatabaseError;

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, DatabaseError> {
    mutex
        .lock()
        .map_err(|_| DatabaseError::ConnectionPool("in-memory store lock poisoned".to_string()))
}

#[derive(Default)]
pub struct InMemoryUserStore {
    users: Mutex<HashMap<Uuid, User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let users = lock(&self.users)?;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn create(&self, email: &str, hashed_password: &str) -> Result<User, DatabaseError> {
        let mut users = lock(&self.users)?;
        if users.values().any(|u| u.email == email) {
            return Err(DatabaseError::UniqueConstraintViolation(email.to_string()));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            hashed_password: hashed_password.to_string(),
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(
        &self,
        id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> Result<User, DatabaseError> {
        let mut users = lock(&self.users)?;
        if users.values().any(|u| u.email == email && u.id != id) {
            return Err(DatabaseError::UniqueConstraintViolation(email.to_string()));
        }

        let user = users
            .get_mut(&id)
            .ok_or_else(|| DatabaseError::NotFound(format!("user {}", id)))?;
        user.email = email.to_string();
        user.hashed_password = hashed_password.to_string();
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn reset_all(&self) -> Result<(), DatabaseError> {
        lock(&self.users)?.clear();
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryRefreshTokenStore {
    tokens: Mutex<HashMap<String, RefreshTokenRecord>>,
}

impl InMemoryRefreshTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RefreshTokenStore for InMemoryRefreshTokenStore {
    async fn insert(
        &self,
        token: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        let mut tokens = lock(&self.tokens)?;
        if tokens.contains_key(token) {
            return Err(DatabaseError::WriteFailure("refresh token already exists".to_string()));
        }

        tokens.insert(
            token.to_string(),
            RefreshTokenRecord {
                user_id,
                created_at: Utc::now(),
                expires_at,
                revoked_at: None,
            },
        );
        Ok(())
    }

    async fn lookup(&self, token: &str) -> Result<RefreshTokenRecord, DatabaseError> {
        lock(&self.tokens)?
            .get(token)
            .cloned()
            .ok_or_else(|| DatabaseError::NotFound("refresh token".to_string()))
    }

    async fn revoke(&self, token: &str) -> Result<(), DatabaseError> {
        let mut tokens = lock(&self.tokens)?;
        let record = tokens
            .get_mut(token)
            .ok_or_else(|| DatabaseError::NotFound("refresh token".to_string()))?;
        record.revoked_at.get_or_insert_with(Utc::now);
        Ok(())
    }

    async fn reset_all(&self) -> Result<(), DatabaseError> {
        lock(&self.tokens)?.clear();
        Ok(())
    }
}
