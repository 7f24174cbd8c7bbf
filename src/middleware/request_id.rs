use std::future::{Ready, ready};
use std::pin::Pin;

use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready};
use actix_web::http::header::{HeaderName, HeaderValue};
use actix_web::{Error, HttpMessage};
use uuid::Uuid;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// 确保每个请求拥有 `X-Request-Id` 的中间件：
/// - 若请求头包含 `X-Request-Id` 则复用，否则生成 UUID v4
/// - 将 Request-Id 写入请求扩展（extensions），供 `LogRequest` 等下游读取
/// - 将 `X-Request-Id` 写入响应头，便于与日志关联
pub struct RequestId;

/// 当前请求的 Request-Id
#[derive(Debug, Clone)]
pub struct RequestIdValue(pub String);

impl<S, B> Transform<S, ServiceRequest> for RequestId
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = RequestIdMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestIdMiddleware { service }))
    }
}

pub struct RequestIdMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for RequestIdMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future =
        Pin<Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + 'static>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let header_name = HeaderName::from_static(REQUEST_ID_HEADER);
        let request_id = req
            .headers()
            .get(&header_name)
            .and_then(|v| v.to_str().ok())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        req.extensions_mut()
            .insert(RequestIdValue(request_id.clone()));

        let fut = self.service.call(req);

        Box::pin(async move {
            let mut res = fut.await?;
            if let Ok(val) = HeaderValue::from_str(&request_id) {
                res.headers_mut().insert(header_name, val);
            }
            Ok(res)
        })
    }
}
