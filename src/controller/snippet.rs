use actix_web::http::StatusCode;
use actix_web::{HttpResponse, web};

use super::method_not_allowed;
use crate::application::{Application, PageContext};
use crate::domain::{MAX_TITLE_RUNES, PERMITTED_EXPIRY_DAYS};
use crate::dto::SnippetCreateForm;
use crate::dto::snippet::{FIELD_CONTENT, FIELD_EXPIRES, FIELD_TITLE};
use crate::middleware::{CsrfForm, RequireAuthentication};
use crate::templates::{CREATE_PAGE, FormData, HOME_PAGE, VIEW_PAGE};
use crate::util::validation::{not_blank, permitted, runes_max};
use crate::util::{AppError, ResponseBuilder, Validator};

pub struct SnippetController;

impl SnippetController {
    pub fn configure(cfg: &mut web::ServiceConfig) {
        cfg.service(
            web::resource("/")
                .route(web::get().to(Self::home))
                .default_service(web::to(method_not_allowed)),
        )
        .service(
            web::resource("/snippet/view/{id}")
                .route(web::get().to(Self::view))
                .default_service(web::to(method_not_allowed)),
        )
        .service(
            web::resource("/snippet/create")
                .wrap(RequireAuthentication)
                .route(web::get().to(Self::create_form))
                .route(web::post().to(Self::create))
                .default_service(web::to(method_not_allowed)),
        );
    }

    async fn home(
        app: web::Data<Application>,
        ctx: PageContext,
    ) -> Result<HttpResponse, AppError> {
        let snippets = app.snippets.latest().await?;
        let mut data = ctx.template_data();
        data.snippets = snippets;
        app.render(StatusCode::OK, HOME_PAGE, &data)
    }

    async fn view(
        app: web::Data<Application>,
        ctx: PageContext,
        path: web::Path<String>,
    ) -> Result<HttpResponse, AppError> {
        let id = parse_id(&path).ok_or(AppError::NotFound)?;
        let snippet = app.snippets.get(id).await?;
        let mut data = ctx.template_data();
        data.snippet = Some(snippet);
        app.render(StatusCode::OK, VIEW_PAGE, &data)
    }

    async fn create_form(
        app: web::Data<Application>,
        ctx: PageContext,
    ) -> Result<HttpResponse, AppError> {
        let data = ctx
            .template_data()
            .with_form(FormData::SnippetCreate(SnippetCreateForm::default()));
        app.render(StatusCode::OK, CREATE_PAGE, &data)
    }

    async fn create(
        app: web::Data<Application>,
        ctx: PageContext,
        form: CsrfForm<SnippetCreateForm>,
    ) -> Result<HttpResponse, AppError> {
        let form = form.into_inner();
        let errors = validate_create(&form);
        if !errors.is_valid() {
            let data = ctx
                .template_data()
                .with_form(FormData::SnippetCreate(form))
                .with_errors(errors);
            return app.render(StatusCode::UNPROCESSABLE_ENTITY, CREATE_PAGE, &data);
        }

        let id = app
            .snippets
            .insert(&form.title, &form.content, form.expires)
            .await?;
        ctx.put_flash("Snippet was successfully created!")?;
        Ok(ResponseBuilder::see_other(format!("/snippet/view/{id}")))
    }
}

/// Positive integer ids only; anything else is treated as not found.
fn parse_id(raw: &str) -> Option<i64> {
    raw.parse::<i64>().ok().filter(|id| *id >= 1)
}

fn validate_create(form: &SnippetCreateForm) -> Validator {
    let mut v = Validator::new();
    v.check_field(not_blank(&form.title), FIELD_TITLE, "this field cannot be blank");
    v.check_field(
        runes_max(&form.title, MAX_TITLE_RUNES),
        FIELD_TITLE,
        "this field cannot be more than 100 characters long",
    );
    v.check_field(not_blank(&form.content), FIELD_CONTENT, "this field cannot be blank");
    v.check_field(
        permitted(&form.expires, &PERMITTED_EXPIRY_DAYS),
        FIELD_EXPIRES,
        "this field must be one of 1, 7, or 365",
    );
    v
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(title: &str, content: &str, expires: i64) -> SnippetCreateForm {
        SnippetCreateForm {
            title: title.into(),
            content: content.into(),
            expires,
            csrf_token: String::new(),
        }
    }

    #[test]
    fn parse_id_rejects_non_positive_and_garbage() {
        assert_eq!(parse_id("42"), Some(42));
        assert_eq!(parse_id("0"), None);
        assert_eq!(parse_id("-3"), None);
        assert_eq!(parse_id("abc"), None);
        assert_eq!(parse_id("1.5"), None);
    }

    #[test]
    fn valid_form_passes() {
        assert!(validate_create(&form("O snail", "Climb Mount Fuji", 7)).is_valid());
    }

    #[test]
    fn title_rules() {
        let v = validate_create(&form("   ", "content", 1));
        assert_eq!(v.field_error(FIELD_TITLE).as_deref(), Some("this field cannot be blank"));

        let exactly_100 = "é".repeat(100);
        assert!(validate_create(&form(&exactly_100, "content", 1)).is_valid());

        let v = validate_create(&form(&"a".repeat(101), "content", 1));
        assert_eq!(
            v.field_error(FIELD_TITLE).as_deref(),
            Some("this field cannot be more than 100 characters long")
        );
    }

    #[test]
    fn expires_must_be_permitted() {
        let v = validate_create(&form("t", "c", 30));
        assert_eq!(
            v.field_error(FIELD_EXPIRES).as_deref(),
            Some("this field must be one of 1, 7, or 365")
        );
        assert!(v.field_error(FIELD_TITLE).is_none());
    }

    #[test]
    fn out_of_range_expiry_is_a_field_error() {
        let v = validate_create(&form("t", "c", 3_000_000_000));
        assert_eq!(
            v.field_error(FIELD_EXPIRES).as_deref(),
            Some("this field must be one of 1, 7, or 365")
        );
        assert!(!validate_create(&form("t", "c", -7)).is_valid());
    }
}
