//! Request completion logging.
//!
//! Emits one event per request with method, path, status, elapsed time and
//! trace identifier. Failures recorded by [`ExceptionHandlers`] are logged at
//! `warn` for client errors and `error` for server errors together with the
//! rendered code and message.
//!
//! [`ExceptionHandlers`]: crate::middleware::ExceptionHandlers

use std::task::{Context, Poll};
use std::time::Instant;

use actix_web::{Error, HttpMessage};
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tracing::{error, info, warn};

use crate::domain::TraceId;
use crate::middleware::CapturedException;

/// Middleware logging each completed request.
///
/// Mount it inside [`crate::middleware::Trace`] so the trace identifier is in
/// scope.
#[derive(Clone, Copy, Default)]
pub struct AccessLog;

impl<S, B> Transform<S, ServiceRequest> for AccessLog
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AccessLogMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AccessLogMiddleware { service }))
    }
}

/// Service wrapper produced by [`AccessLog`].
pub struct AccessLogMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for AccessLogMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let method = req.method().clone();
        let path = req.path().to_owned();
        let start = Instant::now();
        let fut = self.service.call(req);
        Box::pin(async move {
            let result = fut.await;
            let elapsed_ms = start.elapsed().as_millis();
            let trace_id = TraceId::current().unwrap_or_default();
            match &result {
                Ok(res) => {
                    let status = res.status().as_u16();
                    let captured = res.request().extensions().get::<CapturedException>().cloned();
                    match captured {
                        Some(captured) if res.status().is_server_error() => error!(
                            %method, %path, status, elapsed_ms, %trace_id,
                            kind = captured.kind.as_str(),
                            code = captured.content.code,
                            msg = %captured.content.msg,
                            "request failed"
                        ),
                        Some(captured) => warn!(
                            %method, %path, status, elapsed_ms, %trace_id,
                            kind = captured.kind.as_str(),
                            code = captured.content.code,
                            msg = %captured.content.msg,
                            "request rejected"
                        ),
                        None => info!(%method, %path, status, elapsed_ms, %trace_id, "request completed"),
                    }
                }
                Err(err) => error!(%method, %path, elapsed_ms, %trace_id, error = %err, "request errored"),
            }
            result
        })
    }
}
