use actix_web::http::StatusCode;
use actix_web::{HttpResponse, web};

use super::method_not_allowed;
use crate::application::{Application, PageContext};
use crate::dto::user::{FIELD_EMAIL, FIELD_NAME, FIELD_PASSWORD};
use crate::dto::{LogoutForm, UserLoginForm, UserSignupForm};
use crate::middleware::{CsrfForm, RequireAuthentication};
use crate::middleware::auth_guard::LOGIN_PATH;
use crate::service::{SESSION_KEY_AUTH, UserError};
use crate::templates::{FormData, LOGIN_PAGE, SIGNUP_PAGE};
use crate::util::validation::{EMAIL_REGEX, matches, not_blank, runes_min};
use crate::util::{AppError, ResponseBuilder, SessionError, Validator};

const MIN_PASSWORD_RUNES: usize = 8;

pub struct UserController;

impl UserController {
    pub fn configure(cfg: &mut web::ServiceConfig) {
        cfg.service(
            web::resource("/user/signup")
                .route(web::get().to(Self::signup_form))
                .route(web::post().to(Self::signup))
                .default_service(web::to(method_not_allowed)),
        )
        .service(
            web::resource(LOGIN_PATH)
                .route(web::get().to(Self::login_form))
                .route(web::post().to(Self::login))
                .default_service(web::to(method_not_allowed)),
        )
        .service(
            web::resource("/user/logout")
                .wrap(RequireAuthentication)
                .route(web::post().to(Self::logout))
                .default_service(web::to(method_not_allowed)),
        );
    }

    async fn signup_form(
        app: web::Data<Application>,
        ctx: PageContext,
    ) -> Result<HttpResponse, AppError> {
        let data = ctx
            .template_data()
            .with_form(FormData::Signup(UserSignupForm::default()));
        app.render(StatusCode::OK, SIGNUP_PAGE, &data)
    }

    async fn signup(
        app: web::Data<Application>,
        ctx: PageContext,
        form: CsrfForm<UserSignupForm>,
    ) -> Result<HttpResponse, AppError> {
        let form = form.into_inner();
        let mut errors = validate_signup(&form);

        if errors.is_valid() {
            match app.users.insert(&form.name, &form.email, &form.password).await {
                Ok(_) => {
                    ctx.put_flash("Your signup was successful. Please log in.")?;
                    return Ok(ResponseBuilder::see_other(LOGIN_PATH));
                }
                Err(UserError::DuplicateEmail) => {
                    errors.add_field_error(FIELD_EMAIL, "email address is already in use");
                }
                Err(err) => return Err(err.into()),
            }
        }

        let data = ctx
            .template_data()
            .with_form(FormData::Signup(form.redisplay()))
            .with_errors(errors);
        app.render(StatusCode::UNPROCESSABLE_ENTITY, SIGNUP_PAGE, &data)
    }

    async fn login_form(
        app: web::Data<Application>,
        ctx: PageContext,
    ) -> Result<HttpResponse, AppError> {
        let data = ctx
            .template_data()
            .with_form(FormData::Login(UserLoginForm::default()));
        app.render(StatusCode::OK, LOGIN_PAGE, &data)
    }

    async fn login(
        app: web::Data<Application>,
        ctx: PageContext,
        form: CsrfForm<UserLoginForm>,
    ) -> Result<HttpResponse, AppError> {
        let form = form.into_inner();
        let mut errors = validate_login(&form);

        if errors.is_valid() {
            match app.users.authenticate(&form.email, &form.password).await {
                Ok(user_id) => {
                    let session = ctx.session();
                    session.renew();
                    session
                        .insert(SESSION_KEY_AUTH, user_id)
                        .map_err(|err| SessionError::Insert(err.to_string()))?;
                    return Ok(ResponseBuilder::see_other("/"));
                }
                Err(UserError::InvalidCredentials) => {
                    errors.add_non_field_error("Email or password is incorrect");
                }
                Err(err) => return Err(err.into()),
            }
        }

        let data = ctx
            .template_data()
            .with_form(FormData::Login(form.redisplay()))
            .with_errors(errors);
        app.render(StatusCode::UNPROCESSABLE_ENTITY, LOGIN_PAGE, &data)
    }

    async fn logout(ctx: PageContext, _form: CsrfForm<LogoutForm>) -> Result<HttpResponse, AppError> {
        let session = ctx.session();
        session.renew();
        session.remove(SESSION_KEY_AUTH);
        ctx.put_flash("You've been logged out successfully!")?;
        Ok(ResponseBuilder::see_other("/"))
    }
}

fn validate_signup(form: &UserSignupForm) -> Validator {
    let mut v = Validator::new();
    v.check_field(not_blank(&form.name), FIELD_NAME, "this field cannot be blank");
    v.check_field(not_blank(&form.email), FIELD_EMAIL, "this field cannot be blank");
    v.check_field(
        matches(&form.email, &EMAIL_REGEX),
        FIELD_EMAIL,
        "this field must be a valid email address",
    );
    v.check_field(not_blank(&form.password), FIELD_PASSWORD, "this field cannot be blank");
    v.check_field(
        runes_min(&form.password, MIN_PASSWORD_RUNES),
        FIELD_PASSWORD,
        "this field must be at least 8 runes long",
    );
    v
}

/// Login only checks shape; password length is not revealed here.
fn validate_login(form: &UserLoginForm) -> Validator {
    let mut v = Validator::new();
    v.check_field(not_blank(&form.email), FIELD_EMAIL, "this field cannot be blank");
    v.check_field(
        matches(&form.email, &EMAIL_REGEX),
        FIELD_EMAIL,
        "this field must be a valid email address",
    );
    v.check_field(not_blank(&form.password), FIELD_PASSWORD, "this field cannot be blank");
    v
}
