//! Argon2id password hashing

use anyhow::{Result, anyhow};
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

/// Hash a plaintext password into a PHC string
pub fn hash_password(plain: &str) -> Result<String> {
    let salt = SaltString::generate(&mut rand_core::OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| anyhow!("Password hashing error: {}", e))?;
    Ok(hash.to_string())
}

/// Whether `value` already is a PHC password hash
pub fn is_password_hash(value: &str) -> bool {
    PasswordHash::new(value).is_ok()
}

/// Check a plaintext password against a stored hash
///
/// A stored value that is not a hash never verifies.
pub fn verify_password(plain: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}
