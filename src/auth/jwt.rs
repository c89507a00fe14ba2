/// JWT Token Generation and Validation
///
/// Access tokens are HS256-signed and verified purely by recomputation:
/// nothing about them is stored server side.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::fmt;
use uuid::Uuid;

use crate::auth::claims::Claims;

/// Issuer tag stamped into every access token
pub const ISSUER: &str = "chirpy";

/// Only the HMAC family is accepted. Anything else in the header is refused
/// before the signature is looked at.
const HMAC_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    Signing(String),
    InvalidSignature,
    UnsupportedAlgorithm,
    Expired,
    InvalidIssuer,
    MalformedSubject,
    Malformed(String),
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenError::Signing(msg) => write!(f, "Token generation failed: {}", msg),
            TokenError::InvalidSignature => write!(f, "token signature does not match"),
            TokenError::UnsupportedAlgorithm => write!(f, "unexpected signing method"),
            TokenError::Expired => write!(f, "token has expired"),
            TokenError::InvalidIssuer => write!(f, "token issuer does not match"),
            TokenError::MalformedSubject => write!(f, "invalid user ID in token"),
            TokenError::Malformed(msg) => write!(f, "malformed token: {}", msg),
        }
    }
}

impl std::error::Error for TokenError {}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            ErrorKind::InvalidAlgorithm => TokenError::UnsupportedAlgorithm,
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidIssuer => TokenError::InvalidIssuer,
            _ => TokenError::Malformed(err.to_string()),
        }
    }
}

/// Issue a new access token for a user
///
/// # Arguments
/// * `user_id` - Subject of the token
/// * `secret` - HMAC signing secret
/// * `ttl` - Lifetime from now; negative values produce an expired token
///
/// # Errors
/// Returns error only if the signing library fails
pub fn issue_access_token(
    user_id: &Uuid,
    secret: &str,
    ttl: chrono::Duration,
) -> Result<String, TokenError> {
    let claims = Claims::new(*user_id, ttl, ISSUER.to_string());

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| TokenError::Signing(e.to_string()))
}

/// Validate an access token and return the user ID it was issued to
///
/// # Errors
/// Returns error if the token is malformed, signed with another secret or a
/// non-HMAC algorithm, expired, or carries a subject that is not a UUID
pub fn validate_access_token(token: &str, secret: &str) -> Result<Uuid, TokenError> {
    let header = decode_header(token)?;
    if !HMAC_ALGORITHMS.contains(&header.alg) {
        return Err(TokenError::UnsupportedAlgorithm);
    }

    let mut validation = Validation::new(header.alg);
    validation.algorithms = HMAC_ALGORITHMS.to_vec();
    validation.leeway = 0;
    validation.set_issuer(&[ISSUER]);
    validation.set_required_spec_claims(&["exp", "iss", "sub"]);

    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )?
    .claims;

    // jsonwebtoken accepts exp == now; a token is dead from its expiry second on
    if claims.is_expired() {
        return Err(TokenError::Expired);
    }

    claims.user_id().ok_or(TokenError::MalformedSubject)
}
