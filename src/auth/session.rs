/// Session Orchestration
///
/// Login, refresh and revoke. Every rejection is recorded here with its exact
/// cause; the HTTP layer only ever sees the flattened [`AuthError`].

use chrono::Utc;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::bearer::{self, BearerError, Scheme};
use crate::auth::jwt::{issue_access_token, TokenError};
use crate::auth::password::{verify_password, HashingError};
use crate::auth::refresh_token::generate_refresh_token;
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError, DatabaseError};
use crate::metrics::Counter;
use crate::store::{RefreshTokenStore, UserStore};

/// Well-formed cost-13 bcrypt hash that no password is expected to match.
/// Verified against when the email is unknown.
const UNKNOWN_USER_HASH: &str = "$2b$13$Xk3vP9qLmZ2wRt7yNc5hBeJd8sQ1fGzT4uVn0pKx6oWb2rHy9lAmC";

/// Tokens handed out by a successful login
#[derive(Debug, Clone)]
pub struct LoginTokens {
    pub access_token: String,
    pub refresh_token: String,
}

/// Why a session operation failed.
///
/// The authentication variants are distinct so the logs can tell them apart,
/// and collapse into a single outward error each.
#[derive(Debug)]
pub enum SessionError {
    MissingCredentials,
    UnknownEmail,
    WrongPassword,
    Unauthenticated(BearerError),
    RefreshNotFound,
    RefreshExpired,
    RefreshRevoked,
    Hashing(HashingError),
    Signing(TokenError),
    Entropy(String),
    Store(DatabaseError),
}

impl SessionError {
    /// The error the caller is allowed to see
    pub fn outward(&self) -> Option<AuthError> {
        match self {
            SessionError::MissingCredentials
            | SessionError::UnknownEmail
            | SessionError::WrongPassword => Some(AuthError::InvalidCredentials),
            SessionError::Unauthenticated(_) => Some(AuthError::MissingToken),
            SessionError::RefreshNotFound
            | SessionError::RefreshExpired
            | SessionError::RefreshRevoked => Some(AuthError::TokenInvalid),
            _ => None,
        }
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::MissingCredentials => write!(f, "email or password missing"),
            SessionError::UnknownEmail => write!(f, "no user with that email"),
            SessionError::WrongPassword => write!(f, "password does not match"),
            SessionError::Unauthenticated(e) => write!(f, "{}", e),
            SessionError::RefreshNotFound => write!(f, "refresh token not found"),
            SessionError::RefreshExpired => write!(f, "refresh token expired"),
            SessionError::RefreshRevoked => write!(f, "refresh token revoked"),
            SessionError::Hashing(e) => write!(f, "{}", e),
            SessionError::Signing(e) => write!(f, "{}", e),
            SessionError::Entropy(msg) => write!(f, "Refresh token generation failed: {}", msg),
            SessionError::Store(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err.outward() {
            Some(auth) => AppError::Auth(auth),
            None => match err {
                SessionError::Store(e) => AppError::Database(e),
                other => AppError::Internal(other.to_string()),
            },
        }
    }
}

/// Composes hashing, token signing and the refresh token store
#[derive(Clone)]
pub struct SessionService {
    users: Arc<dyn UserStore>,
    refresh_tokens: Arc<dyn RefreshTokenStore>,
    jwt: JwtSettings,
    failed_logins: Arc<dyn Counter>,
}

impl SessionService {
    pub fn new(
        users: Arc<dyn UserStore>,
        refresh_tokens: Arc<dyn RefreshTokenStore>,
        jwt: JwtSettings,
        failed_logins: Arc<dyn Counter>,
    ) -> Self {
        Self {
            users,
            refresh_tokens,
            jwt,
            failed_logins,
        }
    }

    /// Check a password and open a session.
    ///
    /// Prior refresh tokens of the user stay valid.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginTokens, SessionError> {
        match self.check_credentials(email, password).await {
            Ok(user_id) => self.open_session(user_id).await,
            Err(e) => {
                if e.outward().is_some() {
                    let attempts = self.failed_logins.increment();
                    tracing::warn!(cause = %e, failed_logins = attempts, "Login rejected");
                }
                Err(e)
            }
        }
    }

    async fn check_credentials(&self, email: &str, password: &str) -> Result<Uuid, SessionError> {
        if email.is_empty() || password.is_empty() {
            return Err(SessionError::MissingCredentials);
        }

        let user = self
            .users
            .find_by_email(email)
            .await
            .map_err(SessionError::Store)?;

        // An unknown email still pays for a full bcrypt round so response
        // time does not reveal which accounts exist.
        let (user_id, hashed) = match user {
            Some(user) => (Some(user.id), user.hashed_password),
            None => (None, UNKNOWN_USER_HASH.to_string()),
        };

        // bcrypt blocks for a quarter second; keep it off the async workers
        let password = password.to_string();
        let matches = tokio::task::spawn_blocking(move || verify_password(&password, &hashed))
            .await
            .map_err(|e| SessionError::Hashing(HashingError::from(e)))?
            .map_err(SessionError::Hashing)?;

        match user_id {
            None => Err(SessionError::UnknownEmail),
            Some(_) if !matches => Err(SessionError::WrongPassword),
            Some(id) => Ok(id),
        }
    }

    async fn open_session(&self, user_id: Uuid) -> Result<LoginTokens, SessionError> {
        let access_token = issue_access_token(&user_id, &self.jwt.secret, self.jwt.access_token_ttl())
            .map_err(SessionError::Signing)?;
        let refresh_token =
            generate_refresh_token().map_err(|e| SessionError::Entropy(e.to_string()))?;

        let expires_at = Utc::now() + self.jwt.refresh_token_ttl();
        self.refresh_tokens
            .insert(&refresh_token, user_id, expires_at)
            .await
            .map_err(SessionError::Store)?;

        tracing::info!(user_id = %user_id, "User logged in successfully");

        Ok(LoginTokens {
            access_token,
            refresh_token,
        })
    }

    /// Exchange the refresh token in `authorization` for a new access token.
    ///
    /// The refresh token itself is neither rotated nor extended.
    pub async fn refresh(&self, authorization: Option<&str>) -> Result<String, SessionError> {
        let token =
            bearer::extract(authorization, Scheme::Bearer).map_err(SessionError::Unauthenticated)?;

        let record = match self.refresh_tokens.lookup(&token).await {
            Ok(record) => record,
            Err(DatabaseError::NotFound(_)) => {
                tracing::warn!("Refresh token not found");
                return Err(SessionError::RefreshNotFound);
            }
            Err(e) => return Err(SessionError::Store(e)),
        };

        if !record.is_usable_at(Utc::now()) {
            if record.is_revoked() {
                tracing::warn!(user_id = %record.user_id, "Attempt to use revoked refresh token");
                return Err(SessionError::RefreshRevoked);
            }
            tracing::info!(user_id = %record.user_id, "Refresh token expired");
            return Err(SessionError::RefreshExpired);
        }

        let access_token =
            issue_access_token(&record.user_id, &self.jwt.secret, self.jwt.access_token_ttl())
                .map_err(SessionError::Signing)?;

        tracing::info!(user_id = %record.user_id, "Access token refreshed");
        Ok(access_token)
    }

    /// Revoke the refresh token in `authorization`.
    ///
    /// Succeeds whether or not the token exists or was already revoked.
    pub async fn revoke(&self, authorization: Option<&str>) -> Result<(), SessionError> {
        let token =
            bearer::extract(authorization, Scheme::Bearer).map_err(SessionError::Unauthenticated)?;

        match self.refresh_tokens.revoke(&token).await {
            Ok(()) => {
                tracing::info!("Refresh token revoked");
                Ok(())
            }
            Err(DatabaseError::NotFound(_)) => {
                tracing::debug!("Revoke requested for unknown refresh token");
                Ok(())
            }
            Err(e) => Err(SessionError::Store(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::validate_access_token;
    use crate::auth::password::hash_password;
    use crate::metrics::AtomicCounter;
    use crate::store::{InMemoryRefreshTokenStore, InMemoryUserStore};

    const EMAIL: &str = "walt@breakingbad.com";
    const PASSWORD: &str = "123456";

    struct TestSession {
        service: SessionService,
        refresh_tokens: Arc<InMemoryRefreshTokenStore>,
        failed_logins: Arc<AtomicCounter>,
        user_id: Uuid,
    }

    fn jwt_settings() -> JwtSettings {
        JwtSettings {
            secret: "test-secret-key-at-least-32-characters-long".to_string(),
            access_token_expiry: 3600,
            refresh_token_expiry: 5_184_000,
        }
    }

    async fn session() -> TestSession {
        let users = Arc::new(InMemoryUserStore::new());
        let refresh_tokens = Arc::new(InMemoryRefreshTokenStore::new());
        let failed_logins = Arc::new(AtomicCounter::new());

        let user = users
            .create(EMAIL, &hash_password(PASSWORD).unwrap())
            .await
            .unwrap();

        let service = SessionService::new(
            users,
            refresh_tokens.clone(),
            jwt_settings(),
            failed_logins.clone(),
        );

        TestSession {
            service,
            refresh_tokens,
            failed_logins,
            user_id: user.id,
        }
    }

    fn bearer(token: &str) -> String {
        format!("Bearer {}", token)
    }

    #[tokio::test]
    async fn test_login_issues_both_tokens() {
        let s = session().await;

        let tokens = s.service.login(EMAIL, PASSWORD).await.unwrap();

        let secret = jwt_settings().secret;
        assert_eq!(validate_access_token(&tokens.access_token, &secret), Ok(s.user_id));
        assert_eq!(tokens.refresh_token.len(), 64);

        let record = s.refresh_tokens.lookup(&tokens.refresh_token).await.unwrap();
        assert_eq!(record.user_id, s.user_id);
        let lifetime = record.expires_at - record.created_at;
        assert!((lifetime - chrono::Duration::days(60)).num_seconds().abs() <= 1);
    }

    #[tokio::test]
    async fn test_unknown_email_and_wrong_password_look_the_same() {
        let s = session().await;

        let unknown = s.service.login("nobody@example.com", PASSWORD).await.unwrap_err();
        let wrong = s.service.login(EMAIL, "wrongpassword").await.unwrap_err();

        assert!(matches!(unknown, SessionError::UnknownEmail));
        assert!(matches!(wrong, SessionError::WrongPassword));
        assert_eq!(unknown.outward(), Some(AuthError::InvalidCredentials));
        assert_eq!(unknown.outward(), wrong.outward());
        assert_eq!(
            AppError::from(unknown).to_string(),
            AppError::from(wrong).to_string()
        );
        assert_eq!(s.failed_logins.get(), 2);
    }

    #[test]
    fn test_unknown_user_hash_is_well_formed() {
        assert!(UNKNOWN_USER_HASH.starts_with("$2b$13$"));
        assert!(!verify_password(PASSWORD, UNKNOWN_USER_HASH).unwrap());
    }

    #[tokio::test]
    async fn test_unknown_email_costs_a_full_verification() {
        let s = session().await;

        let start = std::time::Instant::now();
        s.service.login("nobody@example.com", PASSWORD).await.unwrap_err();
        let unknown_email = start.elapsed();

        let start = std::time::Instant::now();
        s.service.login(EMAIL, "wrongpassword").await.unwrap_err();
        let wrong_password = start.elapsed();

        assert!(
            unknown_email * 4 >= wrong_password && wrong_password * 4 >= unknown_email,
            "unknown email took {:?}, wrong password took {:?}",
            unknown_email,
            wrong_password
        );
    }

    #[tokio::test]
    async fn test_empty_credentials_rejected() {
        let s = session().await;

        let err = s.service.login("", "").await.unwrap_err();
        assert_eq!(err.outward(), Some(AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_refresh_issues_new_access_token() {
        let s = session().await;
        let tokens = s.service.login(EMAIL, PASSWORD).await.unwrap();

        // iat has second resolution
        tokio::time::sleep(std::time::Duration::from_millis(1100)).await;
        let access_token = s
            .service
            .refresh(Some(&bearer(&tokens.refresh_token)))
            .await
            .unwrap();

        assert_ne!(access_token, tokens.access_token);
        let secret = jwt_settings().secret;
        assert_eq!(validate_access_token(&access_token, &secret), Ok(s.user_id));

        // no rotation: the same refresh token keeps working
        assert!(s.service.refresh(Some(&bearer(&tokens.refresh_token))).await.is_ok());
    }

    #[tokio::test]
    async fn test_refresh_requires_bearer_header() {
        let s = session().await;

        let missing = s.service.refresh(None).await.unwrap_err();
        let wrong_scheme = s.service.refresh(Some("Basic xyz")).await.unwrap_err();

        assert!(matches!(missing, SessionError::Unauthenticated(BearerError::MissingHeader)));
        assert!(matches!(
            wrong_scheme,
            SessionError::Unauthenticated(BearerError::SchemeMismatch)
        ));
    }

    #[tokio::test]
    async fn test_refresh_with_unknown_token() {
        let s = session().await;

        let err = s.service.refresh(Some(&bearer("deadbeef"))).await.unwrap_err();
        assert!(matches!(err, SessionError::RefreshNotFound));
        assert_eq!(err.outward(), Some(AuthError::TokenInvalid));
    }

    #[tokio::test]
    async fn test_refresh_with_expired_token() {
        let s = session().await;
        s.refresh_tokens
            .insert("expired", s.user_id, Utc::now() - chrono::Duration::seconds(1))
            .await
            .unwrap();

        let err = s.service.refresh(Some(&bearer("expired"))).await.unwrap_err();
        assert!(matches!(err, SessionError::RefreshExpired));
        assert_eq!(err.outward(), Some(AuthError::TokenInvalid));
    }

    #[tokio::test]
    async fn test_revoked_token_cannot_refresh() {
        let s = session().await;
        let tokens = s.service.login(EMAIL, PASSWORD).await.unwrap();
        let header = bearer(&tokens.refresh_token);

        s.service.revoke(Some(&header)).await.unwrap();
        let err = s.service.refresh(Some(&header)).await.unwrap_err();

        assert!(matches!(err, SessionError::RefreshRevoked));
        assert_eq!(err.outward(), Some(AuthError::TokenInvalid));
    }

    #[tokio::test]
    async fn test_revoke_twice_succeeds() {
        let s = session().await;
        let tokens = s.service.login(EMAIL, PASSWORD).await.unwrap();
        let header = bearer(&tokens.refresh_token);

        assert!(s.service.revoke(Some(&header)).await.is_ok());
        assert!(s.service.revoke(Some(&header)).await.is_ok());
    }

    #[tokio::test]
    async fn test_revoke_unknown_token_succeeds() {
        let s = session().await;
        assert!(s.service.revoke(Some(&bearer("deadbeef"))).await.is_ok());
    }

    #[tokio::test]
    async fn test_revoke_requires_bearer_header() {
        let s = session().await;

        let err = s.service.revoke(Some("Bearer ")).await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::Unauthenticated(BearerError::MissingCredential)
        ));
    }

    #[tokio::test]
    async fn test_logins_do_not_invalidate_earlier_sessions() {
        let s = session().await;
        let first = s.service.login(EMAIL, PASSWORD).await.unwrap();
        let second = s.service.login(EMAIL, PASSWORD).await.unwrap();

        assert_ne!(first.refresh_token, second.refresh_token);
        assert!(s.service.refresh(Some(&bearer(&first.refresh_token))).await.is_ok());
        assert!(s.service.refresh(Some(&bearer(&second.refresh_token))).await.is_ok());
    }

    #[test]
    fn test_store_failure_is_not_an_auth_failure() {
        let err = SessionError::Store(DatabaseError::WriteFailure("disk full".to_string()));
        assert!(err.outward().is_none());
        assert!(matches!(AppError::from(err), AppError::Database(_)));
    }
}
