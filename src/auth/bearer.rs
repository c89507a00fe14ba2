/// Authorization header parsing
///
/// Splits `Authorization: <scheme> <credential>` on spaces, checks the scheme
/// and returns the second token.

use actix_web::http::header::{HeaderMap, AUTHORIZATION};
use std::fmt;

/// Credential schemes the service accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    /// Session tokens (access or refresh)
    Bearer,
    /// Service API keys
    ApiKey,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Bearer => "bearer",
            Scheme::ApiKey => "apikey",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BearerError {
    MissingHeader,
    SchemeMismatch,
    MissingCredential,
}

impl fmt::Display for BearerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BearerError::MissingHeader => write!(f, "authorization header missing"),
            BearerError::SchemeMismatch => write!(f, "wrong authorization method"),
            BearerError::MissingCredential => write!(f, "credential missing"),
        }
    }
}

impl std::error::Error for BearerError {}

/// Extract the credential from a raw `Authorization` header value
pub fn extract(header: Option<&str>, scheme: Scheme) -> Result<String, BearerError> {
    let header = match header {
        Some(value) if !value.is_empty() => value,
        _ => return Err(BearerError::MissingHeader),
    };

    let mut parts = header.split(' ');
    let name = parts.next().unwrap_or_default();
    let credential = parts.next().unwrap_or_default();

    if !name.eq_ignore_ascii_case(scheme.as_str()) {
        return Err(BearerError::SchemeMismatch);
    }

    if credential.is_empty() {
        return Err(BearerError::MissingCredential);
    }

    Ok(credential.to_string())
}

/// Extract the credential from request headers.
///
/// A header value that is not valid UTF-8 is treated as missing.
pub fn extract_from_headers(headers: &HeaderMap, scheme: Scheme) -> Result<String, BearerError> {
    let header = headers.get(AUTHORIZATION).and_then(|h| h.to_str().ok());
    extract(header, scheme)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::header::HeaderValue;

    #[test]
    fn test_bearer_token() {
        assert_eq!(extract(Some("Bearer abc123"), Scheme::Bearer), Ok("abc123".to_string()));
    }

    #[test]
    fn test_scheme_is_case_insensitive() {
        assert_eq!(extract(Some("bEaReR abc123"), Scheme::Bearer), Ok("abc123".to_string()));
        assert_eq!(extract(Some("APIKEY key"), Scheme::ApiKey), Ok("key".to_string()));
    }

    #[test]
    fn test_missing_header() {
        assert_eq!(extract(None, Scheme::Bearer), Err(BearerError::MissingHeader));
        assert_eq!(extract(Some(""), Scheme::Bearer), Err(BearerError::MissingHeader));
    }

    #[test]
    fn test_wrong_scheme() {
        assert_eq!(extract(Some("Basic xyz"), Scheme::Bearer), Err(BearerError::SchemeMismatch));
        assert_eq!(
            extract(Some("Bearer invalidapikey"), Scheme::ApiKey),
            Err(BearerError::SchemeMismatch)
        );
    }

    #[test]
    fn test_missing_credential() {
        assert_eq!(extract(Some("Bearer "), Scheme::Bearer), Err(BearerError::MissingCredential));
        assert_eq!(extract(Some("Bearer"), Scheme::Bearer), Err(BearerError::MissingCredential));
        assert_eq!(extract(Some("ApiKey "), Scheme::ApiKey), Err(BearerError::MissingCredential));
        assert_eq!(extract(Some("Bearer  abc"), Scheme::Bearer), Err(BearerError::MissingCredential));
    }

    #[test]
    fn test_trailing_tokens_ignored() {
        assert_eq!(extract(Some("Bearer abc extra"), Scheme::Bearer), Ok("abc".to_string()));
    }

    #[test]
    fn test_api_key() {
        assert_eq!(
            extract(Some("ApiKey validapikey"), Scheme::ApiKey),
            Ok("validapikey".to_string())
        );
    }

    #[test]
    fn test_from_header_map() {
        let mut headers = HeaderMap::new();
        assert_eq!(
            extract_from_headers(&headers, Scheme::Bearer),
            Err(BearerError::MissingHeader)
        );

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer validtoken"));
        assert_eq!(
            extract_from_headers(&headers, Scheme::Bearer),
            Ok("validtoken".to_string())
        );
    }
}
