/// Access Token Middleware
///
/// Validates the bearer access token and injects the acting user into request
/// extensions for route handlers.

use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    Error, FromRequest, HttpMessage, HttpRequest,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use std::rc::Rc;
use uuid::Uuid;

use crate::auth::{extract_from_headers, validate_access_token, Scheme};
use crate::error::{AppError, AuthError};

/// The user an access token was issued to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser(pub Uuid);

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let user = req.extensions().get::<AuthenticatedUser>().copied();
        ready(user.ok_or(AppError::Auth(AuthError::MissingToken)))
    }
}

/// Guards a scope behind a valid access token
pub struct JwtMiddleware {
    secret: Rc<str>,
}

impl JwtMiddleware {
    pub fn new(secret: &str) -> Self {
        Self {
            secret: Rc::from(secret),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(JwtMiddlewareService {
            service: Rc::new(service),
            secret: self.secret.clone(),
        }))
    }
}

pub struct JwtMiddlewareService<S> {
    service: Rc<S>,
    secret: Rc<str>,
}

impl<S, B> Service<ServiceRequest> for JwtMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let token = match extract_from_headers(req.headers(), Scheme::Bearer) {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(cause = %e, "Rejected request without usable bearer header");
                let err: Error = AppError::Auth(AuthError::MissingToken).into();
                return Box::pin(async move { Err(err) });
            }
        };

        match validate_access_token(&token, &self.secret) {
            Ok(user_id) => {
                req.extensions_mut().insert(AuthenticatedUser(user_id));
                tracing::debug!(user_id = %user_id, "Access token validated");

                let service = self.service.clone();
                Box::pin(async move { service.call(req).await })
            }
            Err(e) => {
                tracing::warn!(cause = %e, "Access token rejected");
                let err: Error = AppError::Auth(AuthError::TokenInvalid).into();
                Box::pin(async move { Err(err) })
            }
        }
    }
}
