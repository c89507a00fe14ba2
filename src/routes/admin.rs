use actix_web::{web, HttpResponse};
use serde::Serialize;

use crate::error::AppError;
use crate::startup::AppState;

#[derive(Serialize)]
pub struct MetricsResponse {
    pub failed_logins: u64,
}

/// POST /admin/reset
///
/// Deletes every refresh token and user. Only available on the `dev` platform.
pub async fn reset(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    if !state.application.is_dev() {
        return Err(AppError::Forbidden);
    }

    state.refresh_tokens.reset_all().await?;
    state.users.reset_all().await?;
    state.failed_logins.reset();

    tracing::warn!(platform = %state.application.platform, "All users and refresh tokens reset");
    Ok(HttpResponse::Ok().finish())
}

/// GET /admin/metrics
pub async fn metrics(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(MetricsResponse {
        failed_logins: state.failed_logins.get(),
    })
}
