//! Password hashing for user credentials.
//!
//! Passwords are hashed with Argon2id and stored as PHC strings, so the salt
//! and parameters travel with the hash itself.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("password hashing failed: {0}")]
    Hashing(String),
}

/// Hash a plaintext password with a fresh random salt.
///
/// Two calls with the same input return different strings; compare with
/// [`check_password`], never with `==`.
pub fn set_password(plaintext: impl AsRef<str>) -> Result<String, CredentialError> {
    let salt = SaltString::generate(&mut rand_core::OsRng);

    let hash = Argon2::default()
        .hash_password(plaintext.as_ref().as_bytes(), &salt)
        .map_err(|e| CredentialError::Hashing(e.to_string()))?
        .to_string();

    Ok(hash)
}

/// Verify a plaintext password against a stored PHC hash.
///
/// An unparseable hash counts as a mismatch.
pub fn check_password(plaintext: impl AsRef<str>, hash: impl AsRef<str>) -> bool {
    let parsed = match PasswordHash::new(hash.as_ref()) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!("Stored password hash could not be parsed: {}", e);
            return false;
        }
    };

    Argon2::default()
        .verify_password(plaintext.as_ref().as_bytes(), &parsed)
        .is_ok()
}
