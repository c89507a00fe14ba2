/// User Routes
///
/// Registration and credential updates.

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::hash_password;
use crate::error::{AppError, ValidationError};
use crate::middleware::AuthenticatedUser;
use crate::startup::AppState;
use crate::store::User;

#[derive(Deserialize)]
pub struct UserRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl UserRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.email.is_empty() {
            return Err(ValidationError::EmptyField("email".to_string()));
        }
        if self.password.is_empty() {
            return Err(ValidationError::EmptyField("password".to_string()));
        }
        Ok(())
    }
}

/// Public view of a user. Never includes the password hash.
#[derive(Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

async fn hash(password: &str) -> Result<String, AppError> {
    let password = password.to_string();
    Ok(web::block(move || hash_password(&password)).await??)
}

/// POST /api/users
///
/// # Errors
/// - 400: Missing email or password
/// - 409: Email already registered
pub async fn create_user(
    form: web::Json<UserRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    form.validate()?;

    let hashed_password = hash(&form.password).await?;
    let user = state.users.create(&form.email, &hashed_password).await?;

    tracing::info!(user_id = %user.id, "User registered successfully");

    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}

/// PUT /api/users
///
/// Change the email and password of the user the access token belongs to.
/// Requires `Authorization: Bearer <access token>`.
///
/// # Errors
/// - 400: Missing email or password
/// - 401: Missing or invalid access token (handled by middleware)
pub async fn update_user(
    user: AuthenticatedUser,
    form: web::Json<UserRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    form.validate()?;

    let hashed_password = hash(&form.password).await?;
    let updated = state
        .users
        .update(user.0, &form.email, &hashed_password)
        .await?;

    tracing::info!(user_id = %updated.id, "User credentials updated");

    Ok(HttpResponse::Ok().json(UserResponse::from(updated)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields() {
        let request = UserRequest {
            email: String::new(),
            password: "x".to_string(),
        };
        assert_eq!(request.validate().unwrap_err().to_string(), "No email was provided");

        let request = UserRequest {
            email: "a@example.com".to_string(),
            password: String::new(),
        };
        assert_eq!(request.validate().unwrap_err().to_string(), "No password was provided");
    }
}
