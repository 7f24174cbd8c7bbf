//! 基于同步令牌的 CSRF 防护
//!
//! [`CsrfProtect`] 为每个会话保存一个随机令牌，并以 [`CsrfToken`] 的形式提供给
//! handler。修改状态的 handler 通过 [`CsrfForm`] 读取表单，提交的 `csrf_token`
//! 与会话令牌不一致时返回 400

use std::future::{Future, Ready, ready};
use std::ops::Deref;
use std::pin::Pin;
use std::rc::Rc;

use actix_session::SessionExt;
use actix_web::body::{EitherBody, MessageBody};
use actix_web::dev::{Payload, Service, ServiceRequest, ServiceResponse, Transform, forward_ready};
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest, ResponseError, web};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::util::{AppError, SessionError};

pub const SESSION_KEY_CSRF: &str = "csrf_token";

/// 当前会话的防伪令牌
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrfToken(String);

impl CsrfToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Form bodies that carry a `csrf_token` field.
pub trait CsrfField {
    fn csrf_token(&self) -> &str;
}

pub struct CsrfProtect;

impl<S, B> Transform<S, ServiceRequest> for CsrfProtect
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = CsrfProtectMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(CsrfProtectMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct CsrfProtectMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for CsrfProtectMiddleware<S>
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

        Box::pin(async move {
            let token = match session_token(&req) {
                Ok(token) => token,
                Err(err) => {
                    let response = err.error_response();
                    return Ok(req.into_response(response).map_into_right_body());
                }
            };
            req.extensions_mut().insert(token);
            service
                .call(req)
                .await
                .map(ServiceResponse::map_into_left_body)
        })
    }
}

fn session_token(req: &ServiceRequest) -> Result<CsrfToken, AppError> {
    let session = req.get_session();
    match session.get::<String>(SESSION_KEY_CSRF) {
        Ok(Some(token)) if !token.is_empty() => return Ok(CsrfToken(token)),
        Ok(_) => {}
        Err(err) => tracing::warn!(error = %err, "discarding unreadable csrf token"),
    }

    let token = Uuid::new_v4().simple().to_string();
    session
        .insert(SESSION_KEY_CSRF, &token)
        .map_err(|err| AppError::from(SessionError::Insert(err.to_string())))?;
    Ok(CsrfToken(token))
}

impl FromRequest for CsrfToken {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<CsrfToken>()
                .cloned()
                .ok_or_else(|| AppError::Csrf.into()),
        )
    }
}

/// URL-encoded form whose `csrf_token` field has been checked against the
/// session token.
#[derive(Debug)]
pub struct CsrfForm<T>(pub T);

impl<T> CsrfForm<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for CsrfForm<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> FromRequest for CsrfForm<T>
where
    T: DeserializeOwned + CsrfField + 'static,
{
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let expected = req.extensions().get::<CsrfToken>().cloned();
        let form = web::Form::<T>::from_request(req, payload);

        Box::pin(async move {
            let form = form.await?.into_inner();
            let valid = expected.is_some_and(|expected| {
                constant_time_eq(expected.as_str().as_bytes(), form.csrf_token().as_bytes())
            });
            if !valid {
                tracing::warn!("rejecting form with a missing or mismatched csrf token");
                return Err(AppError::Csrf.into());
            }
            Ok(CsrfForm(form))
        })
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
