//! Password hashing and verification (Argon2id, PHC string format).

use argon2::Argon2;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use rand::RngCore;

const SALT_LEN: usize = 16;

/// Hash a password with a fresh random salt.
pub fn hash_password(plain: &str) -> Result<String, PasswordError> {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);
    let salt = SaltString::encode_b64(&salt).map_err(PasswordError::Hash)?;

    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(PasswordError::Hash)?
        .to_string();
    Ok(hash)
}

/// Verify a password against a stored hash.
/// An unparseable hash never verifies.
pub fn verify_password(hash: &str, plain: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(plain.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Hash on the blocking pool; Argon2 is deliberately slow.
pub async fn hash_password_blocking(plain: String) -> Result<String, PasswordError> {
    tokio::task::spawn_blocking(move || hash_password(&plain))
        .await
        .map_err(|e| PasswordError::Join(e.to_string()))?
}

/// Verify on the blocking pool.
pub async fn verify_password_blocking(hash: String, plain: String) -> Result<bool, PasswordError> {
    tokio::task::spawn_blocking(move || verify_password(&hash, &plain))
        .await
        .map_err(|e| PasswordError::Join(e.to_string()))
}

#[derive(Debug)]
pub enum PasswordError {
    Hash(argon2::password_hash::Error),
    Join(String),
}

impl std::fmt::Display for PasswordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PasswordError::Hash(e) => write!(f, "Failed to hash password: {}", e),
            PasswordError::Join(e) => write!(f, "Hashing task failed: {}", e),
        }
    }
}

impl std::error::Error for PasswordError {}
