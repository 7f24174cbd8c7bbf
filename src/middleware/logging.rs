use std::future::{Future, Ready, ready};
use std::pin::Pin;

use actix_web::{Error, HttpMessage};
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready};

use super::request_id::RequestIdValue;

/// 记录每个请求行；服务端错误响应额外记录错误原因和 Request-Id
pub struct LogRequest;

impl<S, B> Transform<S, ServiceRequest> for LogRequest
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = LogRequestMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(LogRequestMiddleware { service }))
    }
}

pub struct LogRequestMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for LogRequestMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let ip = req
            .connection_info()
            .realip_remote_addr()
            .unwrap_or("-")
            .to_string();
        let proto = format!("{:?}", req.version());
        let method = req.method().clone();
        let uri = req.uri().clone();
        let request_id = req
            .extensions()
            .get::<RequestIdValue>()
            .map(|id| id.0.clone())
            .unwrap_or_default();

        tracing::info!(%ip, %proto, %method, %uri, %request_id, "received request");

        let fut = self.service.call(req);
        Box::pin(async move {
            let res = fut.await?;
            if res.status().is_server_error() {
                match res.response().error() {
                    Some(err) => tracing::error!(%method, %uri, %request_id, status = %res.status(), error = %err, "request failed"),
                    None => tracing::error!(%method, %uri, %request_id, status = %res.status(), "request failed"),
                }
            }
            Ok(res)
        })
    }
}
