//! Exception registry middleware.
//!
//! Every error attached to a response leaving the inner service is run
//! through the dispatch table in [`crate::inbound::http::error`] and replaced
//! with the JSON envelope. Handler errors always arrive this way; an `Err`
//! from inner middleware is passed on and rendered by the
//! [`actix_web::ResponseError`] fallback. The
//! rendered content is stored in the request extensions as
//! [`CapturedException`] so outer logging middleware can report it.

use std::rc::Rc;
use std::task::{Context, Poll};

use actix_web::body::{BoxBody, EitherBody};
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{Error, HttpMessage, HttpRequest, HttpResponse};
use futures_util::future::{BoxFuture, LocalBoxFuture, Ready, ready};
use tracing::debug;

use crate::domain::{AppError, Environment, ErrorContent, ExceptionKind, TraceId};
use crate::inbound::http::error::{Rendered, render_actix, valid_headers};
use crate::middleware::trace::request_trace_id;
use crate::settings::TraceSettings;

/// Failure content recorded on the request for downstream middleware.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedException {
    pub kind: ExceptionKind,
    pub content: ErrorContent,
}

/// Middleware converting every failure into the uniform error envelope.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use admin_backend::domain::Environment;
/// use admin_backend::middleware::ExceptionHandlers;
/// use admin_backend::settings::TraceSettings;
///
/// let app = App::new().wrap(ExceptionHandlers::new(
///     Environment::Production,
///     TraceSettings::default(),
/// ));
/// ```
#[derive(Clone)]
pub struct ExceptionHandlers {
    environment: Environment,
    trace: Rc<TraceSettings>,
}

impl ExceptionHandlers {
    #[must_use]
    pub fn new(environment: Environment, trace: TraceSettings) -> Self {
        Self {
            environment,
            trace: Rc::new(trace),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for ExceptionHandlers
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B, BoxBody>>;
    type Error = Error;
    type InitError = ();
    type Transform = ExceptionHandlersMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ExceptionHandlersMiddleware {
            service,
            environment: self.environment,
            trace: Rc::clone(&self.trace),
        }))
    }
}

/// Service wrapper produced by [`ExceptionHandlers`].
pub struct ExceptionHandlersMiddleware<S> {
    service: S,
    environment: Environment,
    trace: Rc<TraceSettings>,
}

impl<S, B> Service<ServiceRequest> for ExceptionHandlersMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B, BoxBody>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let environment = self.environment;
        let trace_id = request_trace_id(req.headers(), &self.trace);
        let fut = self.service.call(req);
        Box::pin(async move {
            let res = fut.await?;
            let handled = res
                .response()
                .error()
                .map(|error| handle(error, environment));
            match handled {
                None => Ok(res.map_into_left_body()),
                Some(handled) => {
                    let (request, _) = res.into_parts();
                    Ok(respond(request, handled, trace_id).map_into_right_body())
                }
            }
        })
    }
}

struct Handled {
    rendered: Rendered,
    background: Option<BoxFuture<'static, ()>>,
}

fn handle(error: &Error, environment: Environment) -> Handled {
    let background = error
        .as_error::<AppError>()
        .and_then(AppError::take_background);
    Handled {
        rendered: render_actix(error, environment),
        background,
    }
}

fn respond(request: HttpRequest, handled: Handled, trace_id: TraceId) -> ServiceResponse {
    let Handled {
        rendered,
        background,
    } = handled;
    debug!(
        kind = rendered.kind.as_str(),
        status = rendered.status.as_u16(),
        %trace_id,
        "rendering exception"
    );
    request.extensions_mut().insert(CapturedException {
        kind: rendered.kind,
        content: rendered.content.clone(),
    });

    let mut builder = HttpResponse::build(rendered.status);
    for header in valid_headers(&rendered.headers) {
        builder.append_header(header);
    }
    let response = builder.json(rendered.content.with_trace_id(trace_id.clone()));

    if let Some(task) = background {
        actix_web::rt::spawn(TraceId::scope(trace_id, task));
    }
    ServiceResponse::new(request, response)
}
