//! Tracing middleware scoping the request's trace identifier.
//!
//! The identifier is read from the configured request header, falling back to
//! the configured default. It is stored in task-local storage for the rest of
//! the request and echoed on the response under the same header.
//!
//! Tokio task-local variables are not inherited across spawned tasks. Use
//! [`TraceId::scope`] when spawning new tasks so the active identifier
//! propagates.

use std::rc::Rc;
use std::task::{Context, Poll};

use actix_web::Error;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{HeaderMap, HeaderValue};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tracing::error;

use crate::domain::TraceId;
use crate::settings::TraceSettings;

/// Trace identifier for a request carrying `headers`.
///
/// # Examples
/// ```
/// use actix_web::http::header::{HeaderMap, HeaderName, HeaderValue};
/// use admin_backend::middleware::trace::request_trace_id;
/// use admin_backend::settings::TraceSettings;
///
/// let settings = TraceSettings::default();
/// let mut headers = HeaderMap::new();
/// assert_eq!(request_trace_id(&headers, &settings).as_str(), "-");
///
/// headers.insert(HeaderName::from_static("x-request-id"), HeaderValue::from_static("r-1"));
/// assert_eq!(request_trace_id(&headers, &settings).as_str(), "r-1");
/// ```
#[must_use]
pub fn request_trace_id(headers: &HeaderMap, settings: &TraceSettings) -> TraceId {
    let value = headers
        .get(&settings.header)
        .and_then(|value| value.to_str().ok());
    TraceId::from_header(value, &settings.default_value)
}

/// Tracing middleware scoping a [`TraceId`] around the rest of the pipeline.
///
/// Handlers can read the identifier via [`TraceId::current`].
///
/// # Examples
/// ```
/// use actix_web::App;
/// use admin_backend::middleware::Trace;
/// use admin_backend::settings::TraceSettings;
///
/// let app = App::new().wrap(Trace::new(TraceSettings::default()));
/// ```
#[derive(Clone)]
pub struct Trace {
    settings: Rc<TraceSettings>,
}

impl Trace {
    #[must_use]
    pub fn new(settings: TraceSettings) -> Self {
        Self {
            settings: Rc::new(settings),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for Trace
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = TraceMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(TraceMiddleware {
            service,
            settings: Rc::clone(&self.settings),
        }))
    }
}

/// Service wrapper produced by [`Trace`].
///
/// Applications should not use this type directly.
pub struct TraceMiddleware<S> {
    service: S,
    settings: Rc<TraceSettings>,
}

impl<S, B> Service<ServiceRequest> for TraceMiddleware<S>
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
        let trace_id = request_trace_id(req.headers(), &self.settings);
        let header = self.settings.header.clone();
        let fut = self.service.call(req);
        Box::pin(TraceId::scope(trace_id.clone(), async move {
            let mut res = fut.await?;
            match HeaderValue::from_str(trace_id.as_str()) {
                Ok(value) => {
                    res.response_mut().headers_mut().insert(header, value);
                }
                Err(error) => {
                    error!(%error, %trace_id, "failed to encode trace identifier header");
                }
            }
            Ok(res)
        }))
    }
}
