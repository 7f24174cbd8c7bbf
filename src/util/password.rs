//! Password hashing and verification utilities.

use bcrypt::{hash, verify};
use thiserror::Error;

/// bcrypt work factor for stored credentials.
pub const PASSWORD_COST: u32 = 12;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password hash failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
    #[error("password hashing task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub fn hash_password(raw: &str, cost: u32) -> Result<String, PasswordError> {
    Ok(hash(raw, cost)?)
}

/// Returns `Ok(false)` on a mismatch; errors only for malformed hashes.
pub fn verify_password(raw: &str, hashed: &str) -> Result<bool, PasswordError> {
    Ok(verify(raw, hashed)?)
}

/// Runs [`hash_password`] on the blocking pool so workers keep serving.
pub async fn hash_password_blocking(raw: String, cost: u32) -> Result<String, PasswordError> {
    tokio::task::spawn_blocking(move || hash_password(&raw, cost)).await?
}

pub async fn verify_password_blocking(raw: String, hashed: String) -> Result<bool, PasswordError> {
    tokio::task::spawn_blocking(move || verify_password(&raw, &hashed)).await?
}
