/// Session Routes
///
/// Login, access token refresh and refresh token revocation.

use actix_web::http::header::AUTHORIZATION;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::startup::AppState;

/// User login request
#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub refresh_token: String,
}

#[derive(Serialize)]
pub struct RefreshResponse {
    pub token: String,
}

fn authorization(req: &HttpRequest) -> Option<&str> {
    req.headers().get(AUTHORIZATION).and_then(|h| h.to_str().ok())
}

/// POST /api/login
///
/// Authenticate with email and password.
///
/// # Errors
/// - 401: Incorrect email or password (same response for an unknown email)
/// - 500: Internal server error
pub async fn login(
    form: web::Json<LoginRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let tokens = state.session.login(&form.email, &form.password).await?;

    Ok(HttpResponse::Ok().json(LoginResponse {
        token: tokens.access_token,
        refresh_token: tokens.refresh_token,
    }))
}

/// POST /api/refresh
///
/// Exchange `Authorization: Bearer <refresh token>` for a new access token.
///
/// # Errors
/// - 401: Missing header, or unknown, expired or revoked refresh token
pub async fn refresh(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let token = state.session.refresh(authorization(&req)).await?;

    Ok(HttpResponse::Ok().json(RefreshResponse { token }))
}

/// POST /api/revoke
///
/// Revoke `Authorization: Bearer <refresh token>`. Answers 204 whether or not
/// the token existed.
///
/// # Errors
/// - 401: Missing or malformed Authorization header
pub async fn revoke(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    state.session.revoke(authorization(&req)).await?;

    Ok(HttpResponse::NoContent().finish())
}
