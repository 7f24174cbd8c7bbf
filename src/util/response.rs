use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use actix_web::http::header::{self, ContentType};

pub struct ResponseBuilder;

impl ResponseBuilder {
    /// 303 See Other，每次表单提交成功后使用
    pub fn see_other(location: impl AsRef<str>) -> HttpResponse {
        HttpResponse::SeeOther()
            .insert_header((header::LOCATION, location.as_ref()))
            .finish()
    }

    /// 写出已完整渲染的页面
    pub fn html(status: StatusCode, body: String) -> HttpResponse {
        HttpResponse::build(status)
            .insert_header(ContentType::html())
            .body(body)
    }

    pub fn text(status: StatusCode, body: &'static str) -> HttpResponse {
        HttpResponse::build(status)
            .insert_header(ContentType::plaintext())
            .body(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn see_other_sets_location() {
        let response = ResponseBuilder::see_other("/snippet/view/3");
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/snippet/view/3"
        );
    }
}
