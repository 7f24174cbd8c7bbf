use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: HashedPassword,
    pub created_at: DateTime<Utc>,
}

/// A bcrypt hash. Plaintext passwords never get wrapped in this type.
#[derive(Clone)]
pub struct HashedPassword(String);

impl std::fmt::Debug for HashedPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("HashedPassword(..)")
    }
}

#[derive(Debug, Error)]
pub enum PasswordHashError {
    #[error("password hash cannot be empty")]
    Empty,
}

impl HashedPassword {
    pub fn new(hash: String) -> Result<Self, PasswordHashError> {
        if hash.trim().is_empty() {
            return Err(PasswordHashError::Empty);
        }
        Ok(Self(hash))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
