pub mod snippet;
pub mod user;

pub use snippet::SnippetCreateForm;
pub use user::{LogoutForm, UserLoginForm, UserSignupForm};
