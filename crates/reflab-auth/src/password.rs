//! Password hashing and verification.
//!
//! Argon2id with a random per-password salt. Verification distinguishes
//! "wrong password" (`Ok(false)`) from a malformed stored hash (an error);
//! the comparison itself is constant-time inside the argon2 crate.

use argon2::Argon2;
use argon2::password_hash::{
    PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
};

use crate::error::AuthError;

/// Hashes a plaintext password into a self-describing PHC string.
///
/// # Errors
///
/// Returns `AuthError::Internal` if hashing fails.
pub fn hash_password(plain: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::internal(format!("password hashing failed: {e}")))
}

/// Verifies a plaintext password against a stored hash.
///
/// # Errors
///
/// Returns `AuthError::Internal` if the stored hash is malformed or
/// verification fails for a reason other than a mismatch.
pub fn verify_password(plain: &str, stored: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(stored)
        .map_err(|e| AuthError::internal(format!("stored password hash is malformed: {e}")))?;
    match Argon2::default().verify_password(plain.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::internal(format!(
            "password verification failed: {e}"
        ))),
    }
}
