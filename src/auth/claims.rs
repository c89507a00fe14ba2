/// JWT Claims structure
///
/// Registered claims only (RFC 7519): the access token carries nothing but
/// who it was issued to, by whom, and for how long.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT Claims for access tokens
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID as UUID string)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Issuer
    pub iss: String,
}

impl Claims {
    /// Create claims for `user_id` valid for `ttl` from now.
    ///
    /// A negative `ttl` yields an already-expired token.
    pub fn new(user_id: Uuid, ttl: chrono::Duration, issuer: String) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: user_id.to_string(),
            exp: now + ttl.num_seconds(),
            iat: now,
            iss: issuer,
        }
    }

    /// Parse the subject as a user ID
    pub fn user_id(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.sub).ok()
    }

    pub fn is_expired(&self) -> bool {
        chrono::Utc::now().timestamp() >= self.exp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_creation() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, chrono::Duration::hours(1), "chirpy".to_string());

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.iss, "chirpy");
        assert_eq!(claims.exp - claims.iat, 3600);
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_negative_ttl_is_expired() {
        let claims = Claims::new(Uuid::new_v4(), chrono::Duration::hours(-1), "chirpy".to_string());
        assert!(claims.is_expired());
    }

    #[test]
    fn test_user_id_extraction() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, chrono::Duration::hours(1), "chirpy".to_string());

        assert_eq!(claims.user_id(), Some(user_id));
    }

    #[test]
    fn test_invalid_user_id() {
        let mut claims = Claims::new(Uuid::new_v4(), chrono::Duration::hours(1), "chirpy".to_string());
        claims.sub = "invalid-uuid".to_string();

        assert!(claims.user_id().is_none());
    }
}
