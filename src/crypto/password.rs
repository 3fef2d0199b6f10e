//! Password hashing (bcrypt).

use anyhow::Result;

/// Hashes a plaintext password with a per-hash random salt.
pub fn hash_password(password: &str) -> Result<String> {
    Ok(bcrypt::hash(password, bcrypt::DEFAULT_COST)?)
}

/// Checks a plaintext password against a stored hash.
///
/// A malformed stored hash counts as a mismatch rather than an error, so a
/// corrupted row can never be logged into.
pub fn verify_password(password: &str, hashed: &str) -> bool {
    bcrypt::verify(password, hashed).unwrap_or(false)
}
