pub mod auth_guard;
pub mod csrf;
pub mod headers;
pub mod logging;
pub mod recover;
pub mod request_id;

pub use auth_guard::{Authenticate, RequireAuthentication};
pub use csrf::{CsrfField, CsrfForm, CsrfProtect, CsrfToken};
pub use headers::common_headers;
pub use logging::LogRequest;
pub use recover::RecoverPanic;
pub use request_id::RequestId;
