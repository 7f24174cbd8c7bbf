pub mod memory;
pub mod session;
pub mod snippet;
pub mod user;

use thiserror::Error;

pub use session::PgSessionStore;
pub use snippet::{NewSnippet, PgSnippetRepository, SnippetRepository};
pub use user::{NewUser, PgUserRepository, UserRepository};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("email address is already registered")]
    DuplicateEmail,
}
