//! Exception dispatch table: maps every failure to a status and envelope.
//!
//! Purpose: keep the domain failure taxonomy HTTP-agnostic while giving every
//! failed request the same `{code, msg, data, trace_id}` body. Verbosity
//! depends on [`Environment`]: development surfaces raw detail, production
//! only ever returns generic messages for non-application failures.

use actix_web::http::StatusCode;
use actix_web::http::header::{HeaderName, HeaderValue};
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use tracing::warn;

use crate::domain::validation::summarize;
use crate::domain::{
    ASSERTION_FAILED, AppError, Environment, ErrorContent, ExceptionKind, ResponseCode, TraceId,
};

/// Convenient result alias for HTTP handlers.
pub type ApiResult<T> = Result<T, AppError>;

/// Status for an exception code: the code itself when it is a known HTTP
/// status, otherwise 400.
///
/// # Examples
/// ```
/// use actix_web::http::StatusCode;
/// use admin_backend::inbound::http::error::exception_status;
///
/// assert_eq!(exception_status(404), StatusCode::NOT_FOUND);
/// assert_eq!(exception_status(40401), StatusCode::BAD_REQUEST);
/// ```
#[must_use]
pub fn exception_status(code: i64) -> StatusCode {
    u16::try_from(code)
        .ok()
        .and_then(|raw| StatusCode::from_u16(raw).ok())
        .filter(|status| status.canonical_reason().is_some())
        .unwrap_or(StatusCode::BAD_REQUEST)
}

/// Outcome of the dispatch table for one failure.
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub status: StatusCode,
    pub kind: ExceptionKind,
    pub content: ErrorContent,
    /// Extra response headers carried by HTTP exceptions.
    pub headers: Vec<(String, String)>,
}

impl Rendered {
    fn new(status: StatusCode, kind: ExceptionKind, content: ErrorContent) -> Self {
        Self {
            status,
            kind,
            content,
            headers: Vec::new(),
        }
    }
}

/// Headers of an HTTP exception that can be sent; invalid pairs are dropped.
pub(crate) fn valid_headers(
    headers: &[(String, String)],
) -> impl Iterator<Item = (HeaderName, HeaderValue)> + '_ {
    headers.iter().filter_map(|(name, value)| {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => Some((name, value)),
            _ => {
                warn!(header = %name, "dropping invalid exception header");
                None
            }
        }
    })
}

fn generic(res: ResponseCode) -> ErrorContent {
    ErrorContent::fail(res)
}

/// Apply the dispatch table to a domain failure.
#[must_use]
pub fn render(error: &AppError, environment: Environment) -> Rendered {
    let kind = error.kind();
    let dev = environment.is_dev();
    match error {
        AppError::Http {
            status,
            detail,
            headers,
        } => {
            let content = if dev {
                ErrorContent::new(i64::from(*status), detail.clone())
            } else {
                generic(ResponseCode::HTTP_400)
            };
            Rendered {
                headers: headers.clone(),
                ..Rendered::new(exception_status(i64::from(*status)), kind, content)
            }
        }
        AppError::Validation(errors) => {
            let errors: Vec<_> = errors.iter().cloned().map(|e| e.localized()).collect();
            let msg = summarize(&errors, environment);
            let data = dev.then(|| json!({ "errors": errors }));
            let content =
                ErrorContent::new(ResponseCode::HTTP_422.code, msg).with_data(data);
            Rendered::new(StatusCode::UNPROCESSABLE_ENTITY, kind, content)
        }
        AppError::Usage(code) => Rendered::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            kind,
            ErrorContent::new(ResponseCode::HTTP_500.code, code.message()),
        ),
        AppError::Assertion { message } => {
            let content = if dev {
                ErrorContent::new(
                    ResponseCode::HTTP_500.code,
                    message.as_deref().unwrap_or(ASSERTION_FAILED),
                )
            } else {
                generic(ResponseCode::HTTP_500)
            };
            Rendered::new(StatusCode::INTERNAL_SERVER_ERROR, kind, content)
        }
        AppError::Custom(custom) => Rendered::new(
            exception_status(custom.code()),
            kind,
            ErrorContent::new(custom.code(), custom.msg()).with_data(custom.data().cloned()),
        ),
        AppError::Unknown(inner) => {
            let content = if dev {
                ErrorContent::new(ResponseCode::HTTP_500.code, inner.to_string())
            } else {
                generic(ResponseCode::HTTP_500)
            };
            Rendered::new(StatusCode::INTERNAL_SERVER_ERROR, kind, content)
        }
    }
}

/// Apply the dispatch table to any framework error.
///
/// Domain failures are unwrapped; other errors become HTTP exceptions when
/// their status is below 500 and unknown failures otherwise.
#[must_use]
pub fn render_actix(error: &actix_web::Error, environment: Environment) -> Rendered {
    if let Some(app_error) = error.as_error::<AppError>() {
        return render(app_error, environment);
    }
    let status = error.as_response_error().status_code();
    let fallback = if status.is_server_error() {
        AppError::unknown(error.to_string())
    } else {
        AppError::http(status.as_u16(), error.to_string())
    };
    render(&fallback, environment)
}

/// Last-resort rendering used when the exception middleware is not mounted.
///
/// Uses production verbosity and the trace identifier in scope, if any.
impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        render(self, Environment::Production).status
    }

    fn error_response(&self) -> HttpResponse {
        let rendered = render(self, Environment::Production);
        let trace_id = TraceId::current().unwrap_or_default();
        let mut builder = HttpResponse::build(rendered.status);
        for header in valid_headers(&rendered.headers) {
            builder.append_header(header);
        }
        builder.json(rendered.content.with_trace_id(trace_id))
    }
}
