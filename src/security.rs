use std::num::NonZeroU32;

use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};

/// PBKDF2-HMAC-SHA512 iteration count for password hashing
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// Per-user random salt length in bytes
pub const SALT_LENGTH: usize = 16;

/// Derived password hash length in bytes (SHA-512 output size)
pub const HASH_LENGTH: usize = 64;

// PBKDF2 requires a non-zero iteration count
fn pbkdf2_iterations() -> NonZeroU32 {
    NonZeroU32::new(PBKDF2_ITERATIONS).unwrap_or(NonZeroU32::MIN)
}

/// Generate a random salt for password hashing
pub fn generate_salt() -> Result<[u8; SALT_LENGTH], ring::error::Unspecified> {
    let mut salt = [0u8; SALT_LENGTH];
    SystemRandom::new().fill(&mut salt)?;
    Ok(salt)
}

/// Derive a password hash with PBKDF2-HMAC-SHA512
///
/// # Arguments
/// * `password` - The plaintext password
/// * `salt` - The per-user random salt
///
/// # Returns
/// * A 64-byte derived hash; callers hex-encode it for storage
pub fn hash_password(password: &str, salt: &[u8]) -> [u8; HASH_LENGTH] {
    let mut hash = [0u8; HASH_LENGTH];
    pbkdf2::derive(
        pbkdf2::PBKDF2_HMAC_SHA512,
        pbkdf2_iterations(),
        salt,
        password.as_bytes(),
        &mut hash,
    );
    hash
}

/// Verify a password against the hex-encoded stored salt and hash
///
/// Comparison happens inside ring's verify, which is constant-time.
/// Corrupt stored values fail verification instead of erroring out.
pub fn verify_password(password: &str, salt_hex: &str, hash_hex: &str) -> bool {
    let salt = match hex::decode(salt_hex) {
        Ok(bytes) => bytes,
        Err(_) => {
            tracing::warn!("Stored password salt is not valid hex");
            return false;
        }
    };

    let expected = match hex::decode(hash_hex) {
        Ok(bytes) => bytes,
        Err(_) => {
            tracing::warn!("Stored password hash is not valid hex");
            return false;
        }
    };

    pbkdf2::verify(
        pbkdf2::PBKDF2_HMAC_SHA512,
        pbkdf2_iterations(),
        &salt,
        password.as_bytes(),
        &expected,
    )
    .is_ok()
}
