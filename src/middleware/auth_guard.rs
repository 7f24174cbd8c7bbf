use std::future::{Future, Ready, ready};
use std::pin::Pin;
use std::rc::Rc;

use actix_session::SessionExt;
use actix_web::body::{EitherBody, MessageBody};
use actix_web::dev::{Payload, Service, ServiceRequest, ServiceResponse, Transform, forward_ready};
use actix_web::http::header::{CACHE_CONTROL, HeaderValue};
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest, ResponseError};

use crate::service::{AuthState, SESSION_KEY_AUTH, UserService, derive_auth_state};
use crate::util::{AppError, ResponseBuilder};

pub const LOGIN_PATH: &str = "/user/login";

/// 认证中间件：从会话推导 [`AuthState`] 并写入请求扩展（extensions）
/// - 会话中的用户已不存在时按匿名处理
/// - 用户存活检查失败时直接返回 500
#[derive(Clone)]
pub struct Authenticate {
    users: UserService,
}

impl Authenticate {
    pub fn new(users: UserService) -> Self {
        Self { users }
    }
}

impl<S, B> Transform<S, ServiceRequest> for Authenticate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthenticateMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthenticateMiddleware {
            service: Rc::new(service),
            users: self.users.clone(),
        }))
    }
}

pub struct AuthenticateMiddleware<S> {
    service: Rc<S>,
    users: UserService,
}

impl<S, B> Service<ServiceRequest> for AuthenticateMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let users = self.users.clone();

        Box::pin(async move {
            let stored_user_id = match req.get_session().get::<i64>(SESSION_KEY_AUTH) {
                Ok(id) => id,
                Err(err) => {
                    tracing::warn!(error = %err, "ignoring malformed user id in session");
                    None
                }
            };

            let state = match derive_auth_state(stored_user_id, &users).await {
                Ok(state) => state,
                Err(err) => {
                    let err = AppError::from(err);
                    tracing::error!(error = %err, "user liveness check failed");
                    let response = err.error_response();
                    return Ok(req.into_response(response).map_into_right_body());
                }
            };

            req.extensions_mut().insert(state);
            service
                .call(req)
                .await
                .map(ServiceResponse::map_into_left_body)
        })
    }
}

/// Sends anonymous visitors to the login page; pages served to
/// authenticated users are marked `Cache-Control: no-store`.
pub struct RequireAuthentication;

impl<S, B> Transform<S, ServiceRequest> for RequireAuthentication
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireAuthenticationMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireAuthenticationMiddleware { service }))
    }
}

pub struct RequireAuthenticationMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for RequireAuthenticationMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let authenticated = req
            .extensions()
            .get::<AuthState>()
            .is_some_and(AuthState::is_authenticated);

        if !authenticated {
            let response = ResponseBuilder::see_other(LOGIN_PATH);
            return Box::pin(async move { Ok(req.into_response(response).map_into_right_body()) });
        }

        let fut = self.service.call(req);
        Box::pin(async move {
            let mut res = fut.await?;
            res.headers_mut()
                .insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
            Ok(res.map_into_left_body())
        })
    }
}

/// Anonymous unless [`Authenticate`] ran and found a live user.
impl FromRequest for AuthState {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Ok(req
            .extensions()
            .get::<AuthState>()
            .copied()
            .unwrap_or_default()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::repository::memory::{InMemorySessionStore, InMemoryUserRepository};
    use actix_session::{Session, SessionMiddleware};
    use actix_web::cookie::{Cookie, Key};
    use actix_web::http::{StatusCode, header};
    use actix_web::{App, HttpResponse, test, web};

    async fn fixture() -> (InMemoryUserRepository, UserService, i64) {
        let repo = InMemoryUserRepository::default();
        let users = UserService::new(Arc::new(repo.clone())).with_password_cost(4);
        let id = users
            .insert("Alice", "alice@example.com", "pa55word!")
            .await
            .unwrap();
        (repo, users, id)
    }

    macro_rules! app {
        ($users:expr) => {
            test::init_service(
                App::new()
                    .wrap(Authenticate::new($users))
                    .wrap(
                        SessionMiddleware::builder(InMemorySessionStore::default(), Key::generate())
                            .cookie_secure(false)
                            .build(),
                    )
                    .route(
                        "/login/{id}",
                        web::get().to(|session: Session, id: web::Path<i64>| async move {
                            session.insert(SESSION_KEY_AUTH, id.into_inner()).unwrap();
                            HttpResponse::Ok().finish()
                        }),
                    )
                    .route(
                        "/whoami",
                        web::get().to(|state: AuthState| async move {
                            HttpResponse::Ok().body(format!("{:?}", state.user_id()))
                        }),
                    )
                    .service(
                        web::resource("/private")
                            .wrap(RequireAuthentication)
                            .route(web::get().to(|| async { HttpResponse::Ok().finish() })),
                    ),
            )
        };
    }

    macro_rules! login_cookie {
        ($app:expr, $id:expr) => {{
            let req = test::TestRequest::get()
                .uri(&format!("/login/{}", $id))
                .to_request();
            let resp = test::call_service(&$app, req).await;
            let cookie: Cookie<'static> = resp.response().cookies().next().unwrap().into_owned();
            cookie
        }};
    }

    #[actix_rt::test]
    async fn anonymous_is_redirected_to_login() {
        let (_, users, _) = fixture().await;
        let app = app!(users).await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/private").to_request()).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers().get(header::LOCATION).unwrap(), LOGIN_PATH);
    }

    #[actix_rt::test]
    async fn live_user_passes_with_no_store() {
        let (_, users, id) = fixture().await;
        let app = app!(users).await;
        let cookie = login_cookie!(app, id);

        let req = test::TestRequest::get().uri("/private").cookie(cookie).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers().get(header::CACHE_CONTROL).unwrap(), "no-store");
    }

    #[actix_rt::test]
    async fn deleted_user_is_anonymous() {
        let (repo, users, id) = fixture().await;
        let app = app!(users).await;
        let cookie = login_cookie!(app, id);
        repo.remove(id).await;

        let req = test::TestRequest::get().uri("/whoami").cookie(cookie).to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, "None");
    }

    #[actix_rt::test]
    async fn liveness_failure_is_a_server_error() {
        let (repo, users, id) = fixture().await;
        let app = app!(users).await;
        let cookie = login_cookie!(app, id);
        repo.set_unavailable(true);

        let req = test::TestRequest::get().uri("/whoami").cookie(cookie).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
