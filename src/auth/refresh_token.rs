/// Refresh Token Minting
///
/// Refresh tokens are opaque: 32 bytes from the operating system's CSPRNG,
/// hex-encoded to 64 characters. Their state lives in the
/// [`RefreshTokenStore`](crate::store::RefreshTokenStore).

use rand::rngs::OsRng;
use rand::RngCore;

/// Number of random bytes behind every refresh token
pub const REFRESH_TOKEN_BYTES: usize = 32;

/// Generate a new cryptographically secure refresh token
///
/// # Errors
/// Returns error if the operating system cannot supply randomness
pub fn generate_refresh_token() -> Result<String, rand::Error> {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    OsRng.try_fill_bytes(&mut bytes)?;
    Ok(hex::encode(bytes))
}
