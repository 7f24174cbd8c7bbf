pub mod auth;
pub mod snippet;
pub mod user;

pub use auth::{AuthState, SESSION_KEY_AUTH, derive_auth_state};
pub use snippet::{SnippetError, SnippetService};
pub use user::{UserError, UserService};
