/// Password Hashing and Verification
///
/// bcrypt with a fixed work factor. Verification goes through bcrypt's own
/// routine, which compares in constant time.

use bcrypt::{hash, verify};
use std::fmt;

/// bcrypt work factor. Keeps a verification around a quarter second on
/// commodity hardware.
pub const HASH_COST: u32 = 13;

/// Failure inside the hashing engine, never a password mismatch
#[derive(Debug)]
pub struct HashingError(String);

impl fmt::Display for HashingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Password hashing failed: {}", self.0)
    }
}

impl std::error::Error for HashingError {}

impl From<tokio::task::JoinError> for HashingError {
    fn from(err: tokio::task::JoinError) -> Self {
        HashingError(format!("hashing task failed: {}", err))
    }
}

impl From<HashingError> for crate::error::AppError {
    fn from(err: HashingError) -> Self {
        crate::error::AppError::Internal(err.to_string())
    }
}

/// Hash a password using bcrypt
///
/// # Errors
/// Returns error only if bcrypt itself fails (entropy or resource exhaustion)
pub fn hash_password(password: &str) -> Result<String, HashingError> {
    hash(password, HASH_COST).map_err(|e| HashingError(e.to_string()))
}

/// Verify a password against its hash
///
/// Returns `Ok(false)` on mismatch.
///
/// # Errors
/// Returns error if the stored hash is malformed
pub fn verify_password(password: &str, hashed: &str) -> Result<bool, HashingError> {
    verify(password, hashed).map_err(|e| HashingError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password() {
        let password = "mysecretpassword";
        let hash = hash_password(password).expect("Failed to hash password");

        assert_ne!(password, hash);
        assert!(hash.starts_with("$2"));
        assert!(hash.contains("$13$"));
    }

    #[test]
    fn test_verify_password() {
        let password = "mysecretpassword";
        let hash = hash_password(password).expect("Failed to hash password");

        let is_valid = verify_password(password, &hash).expect("Failed to verify password");
        assert!(is_valid);
    }

    #[test]
    fn test_verify_wrong_password() {
        let hash = hash_password("mysecretpassword").expect("Failed to hash password");

        let is_valid = verify_password("wrongpassword", &hash).expect("Failed to verify password");
        assert!(!is_valid);
    }

    #[test]
    fn test_same_password_salted_differently() {
        let first = hash_password("hunter2").unwrap();
        let second = hash_password("hunter2").unwrap();

        assert_ne!(first, second);
        assert!(verify_password("hunter2", &second).unwrap());
    }

    #[test]
    fn test_malformed_hash_is_an_error() {
        let result = verify_password("mysecretpassword", "not-a-bcrypt-hash");
        assert!(result.is_err());
    }
}
