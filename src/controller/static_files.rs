use actix_web::http::StatusCode;
use actix_web::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use actix_web::{HttpResponse, web};
use rust_embed::RustEmbed;

use crate::util::{AppError, ResponseBuilder};

/// Stylesheets and scripts compiled into the binary.
#[derive(RustEmbed)]
#[folder = "ui/static/"]
struct Assets;

pub struct StaticController;

impl StaticController {
    pub fn configure(cfg: &mut web::ServiceConfig) {
        cfg.route("/ping", web::get().to(Self::ping))
            .route("/static/{path:.*}", web::get().to(Self::asset));
    }

    async fn ping() -> HttpResponse {
        ResponseBuilder::text(StatusCode::OK, "OK")
    }

    /// No directory listings: only exact file paths resolve.
    async fn asset(path: web::Path<String>) -> Result<HttpResponse, AppError> {
        let path = path.into_inner();
        if path.is_empty() || path.ends_with('/') {
            return Err(AppError::NotFound);
        }
        let file = Assets::get(&path).ok_or(AppError::NotFound)?;
        let mime = mime_guess::from_path(&path).first_or_octet_stream();

        Ok(HttpResponse::Ok()
            .insert_header((CONTENT_TYPE, mime.as_ref()))
            .insert_header((CACHE_CONTROL, "public, max-age=3600"))
            .body(file.data.into_owned()))
    }
}
