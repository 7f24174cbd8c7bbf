//! Application wiring: shared state, the per-page request context and the
//! `App` factory used by both the server and the HTTP tests.

use std::future::{Ready, ready};
use std::sync::Arc;

use actix_session::config::PersistentSession;
use actix_session::storage::SessionStore;
use actix_session::{Session, SessionExt, SessionMiddleware};
use actix_web::body::MessageBody;
use actix_web::cookie::{Key, time};
use actix_web::dev::{Payload, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{App, Error, FromRequest, HttpMessage, HttpRequest, HttpResponse, web};
use chrono::{Datelike, Utc};
use tracing_actix_web::TracingLogger;

use crate::controller::{SnippetController, StaticController, UserController};
use crate::middleware::{
    Authenticate, CsrfProtect, CsrfToken, LogRequest, RecoverPanic, RequestId, common_headers,
};
use crate::service::{AuthState, SnippetService, UserService};
use crate::templates::{TemplateCache, TemplateData};
use crate::util::{AppError, ResponseBuilder, SessionError};

pub const SESSION_KEY_FLASH: &str = "flash";

/// Dependencies shared by every handler.
#[derive(Clone)]
pub struct Application {
    pub users: UserService,
    pub snippets: SnippetService,
    pub templates: Arc<TemplateCache>,
}

impl Application {
    pub fn new(users: UserService, snippets: SnippetService) -> Self {
        Self {
            users,
            snippets,
            templates: Arc::new(TemplateCache::new()),
        }
    }

    /// Renders `page` in full before anything is sent, so a template failure
    /// becomes a clean 500.
    pub fn render(
        &self,
        status: StatusCode,
        page: &str,
        data: &TemplateData,
    ) -> Result<HttpResponse, AppError> {
        let body = self.templates.render(page, data)?;
        Ok(ResponseBuilder::html(status, body))
    }
}

/// Session cookie settings. The state itself lives in the server-side store
/// handed to [`build_app`].
#[derive(Clone)]
pub struct SessionOptions {
    pub key: Key,
    pub secure: bool,
    pub lifetime_hours: i64,
}

impl SessionOptions {
    /// Uses `secret` as the cookie signing key when it is long enough,
    /// otherwise a random per-process key.
    pub fn new(secret: Option<&str>, secure: bool, lifetime_hours: i64) -> Self {
        let key = match secret.map(|s| Key::try_from(s.as_bytes())) {
            Some(Ok(key)) => key,
            Some(Err(err)) => {
                tracing::warn!(error = %err, "session secret rejected, using a random key");
                Key::generate()
            }
            None => {
                tracing::warn!("no session secret configured, sessions won't survive a restart");
                Key::generate()
            }
        };
        Self {
            key,
            secure,
            lifetime_hours,
        }
    }

    fn middleware<St: SessionStore + 'static>(&self, store: St) -> SessionMiddleware<St> {
        SessionMiddleware::builder(store, self.key.clone())
            .cookie_name("session".to_string())
            .cookie_secure(self.secure)
            .cookie_http_only(true)
            .session_lifecycle(
                PersistentSession::default().session_ttl(time::Duration::hours(self.lifetime_hours)),
            )
            .build()
    }
}

/// Per-request view of the session used by page handlers.
pub struct PageContext {
    session: Session,
    auth: AuthState,
    csrf_token: String,
}

impl PageContext {
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Fresh template data for this request. Pops the flash message, so
    /// only call this when a page is actually rendered.
    pub fn template_data(&self) -> TemplateData {
        let flash = match self.session.remove_as::<String>(SESSION_KEY_FLASH) {
            Some(Ok(message)) => Some(message),
            Some(Err(raw)) => {
                tracing::warn!(%raw, "dropping malformed flash message");
                None
            }
            None => None,
        };
        TemplateData {
            current_year: Utc::now().year(),
            flash,
            authenticated: self.auth.is_authenticated(),
            csrf_token: self.csrf_token.clone(),
            ..TemplateData::default()
        }
    }

    pub fn put_flash(&self, message: &str) -> Result<(), AppError> {
        self.session
            .insert(SESSION_KEY_FLASH, message)
            .map_err(|err| AppError::from(SessionError::Insert(err.to_string())))
    }
}

impl FromRequest for PageContext {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let extensions = req.extensions();
        let auth = extensions.get::<AuthState>().copied().unwrap_or_default();
        let csrf_token = extensions
            .get::<CsrfToken>()
            .map(|token| token.as_str().to_string())
            .unwrap_or_default();
        drop(extensions);

        ready(Ok(PageContext {
            session: req.get_session(),
            auth,
            csrf_token,
        }))
    }
}

/// Undecodable form bodies are a client error; the details stay in the log.
fn form_config() -> web::FormConfig {
    web::FormConfig::default().error_handler(|err, req| {
        tracing::debug!(error = %err, path = %req.path(), "rejecting malformed form body");
        AppError::BadRequest.into()
    })
}

/// Builds the full application: static routes, then the session-backed
/// dynamic routes, all behind panic recovery, tracing, request ids, request
/// logging and the common security headers.
pub fn build_app<St>(
    state: Application,
    session: SessionOptions,
    store: St,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = Error,
        InitError = (),
    >,
>
where
    St: SessionStore + 'static,
{
    let users = state.users.clone();

    App::new()
        .app_data(web::Data::new(state))
        .app_data(form_config())
        .wrap(common_headers())
        .wrap(LogRequest)
        .wrap(RequestId)
        .wrap(TracingLogger::default())
        .wrap(RecoverPanic)
        .configure(StaticController::configure)
        .service(
            web::scope("")
                .wrap(Authenticate::new(users))
                .wrap(CsrfProtect)
                .wrap(session.middleware(store))
                .configure(SnippetController::configure)
                .configure(UserController::configure),
        )
        .default_service(web::to(not_found))
}

async fn not_found() -> Result<HttpResponse, AppError> {
    Err(AppError::NotFound)
}
