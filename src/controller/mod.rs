pub mod snippet;
pub mod static_files;
pub mod user;

pub use snippet::SnippetController;
pub use static_files::StaticController;
pub use user::UserController;

use actix_web::HttpResponse;
use actix_web::http::StatusCode;

use crate::util::error::status_text_response;

/// Fallback for a known path hit with an unsupported method.
pub(crate) async fn method_not_allowed() -> HttpResponse {
    status_text_response(StatusCode::METHOD_NOT_ALLOWED)
}
