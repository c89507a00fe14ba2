/// Authentication module
///
/// Password hashing, Authorization header parsing, access token signing,
/// refresh token minting, and the session operations built on them.

pub mod bearer;
mod claims;
mod jwt;
mod password;
mod refresh_token;
mod session;

pub use bearer::{extract, extract_from_headers, BearerError, Scheme};
pub use claims::Claims;
pub use jwt::{issue_access_token, validate_access_token, TokenError, ISSUER};
pub use password::{hash_password, verify_password, HashingError, HASH_COST};
pub use refresh_token::{generate_refresh_token, REFRESH_TOKEN_BYTES};
pub use session::{LoginTokens, SessionError, SessionService};
