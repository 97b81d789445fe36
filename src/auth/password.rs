//! Password Hashing
//! Mission: One-way salted hashing for stored credentials

use anyhow::{Context, Result};
use bcrypt::DEFAULT_COST;

/// Hash a plaintext password with a random salt.
pub fn hash_password(plaintext: &str) -> Result<String> {
    bcrypt::hash(plaintext, DEFAULT_COST).context("Failed to hash password")
}

/// Verify a plaintext password against a stored digest.
///
/// Returns `Ok(false)` for a wrong password; a malformed digest is the only
/// error case, so callers cannot tell a bad password apart from anything else.
pub fn verify_password(plaintext: &str, digest: &str) -> Result<bool> {
    bcrypt::verify(plaintext, digest).context("Failed to verify password")
}
