pub mod snippet;
pub mod user;

pub use snippet::{LATEST_LIMIT, MAX_TITLE_RUNES, PERMITTED_EXPIRY_DAYS, Snippet, expiry_from};
pub use user::{HashedPassword, PasswordHashError, User};
