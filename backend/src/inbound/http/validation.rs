//! Request decoding that reports failures as located validation errors.
//!
//! [`JsonBody`] replaces `web::Json` so body failures carry the path of the
//! offending value. Register [`query_config`] and [`path_config`] as app data
//! so malformed query strings and path segments reach the exception
//! middleware as [`AppError::Validation`] rather than framework text.

use std::sync::OnceLock;

use actix_web::dev::Payload;
use actix_web::error::{PathError, QueryPayloadError};
use actix_web::{FromRequest, HttpMessage, HttpRequest, web};
use futures_util::future::LocalBoxFuture;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use serde_path_to_error::Segment;

use crate::domain::validation::JSON_INVALID;
use crate::domain::{AppError, LocSegment, UserValidationError, ValidationError};

/// Where a decode failure happened; the first `loc` segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Body,
    Query,
    Path,
}

impl Source {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Body => "body",
            Self::Query => "query",
            Self::Path => "path",
        }
    }
}

static POSITION_RE: OnceLock<Regex> = OnceLock::new();
static FIELD_RE: OnceLock<Regex> = OnceLock::new();

fn position_regex() -> &'static Regex {
    POSITION_RE.get_or_init(|| {
        Regex::new(r" at line \d+ column \d+$")
            .unwrap_or_else(|error| panic!("position regex failed to compile: {error}"))
    })
}

fn field_regex() -> &'static Regex {
    FIELD_RE.get_or_init(|| {
        Regex::new(r"^(missing|unknown) field `([^`]+)`")
            .unwrap_or_else(|error| panic!("field regex failed to compile: {error}"))
    })
}

/// Classify a serde data error message into a validation error.
///
/// `serde` only reports messages, so the type is recovered from the stable
/// prefixes it uses: `missing field`, `unknown field` and `invalid type`.
#[must_use]
pub fn classify_message(source: Source, message: &str) -> ValidationError {
    classify_at(source, Vec::new(), message)
}

/// [`classify_message`] for a failure at `path` below the source root.
///
/// Missing and unknown fields are reported by the enclosing object, so their
/// name is appended to `path`.
fn classify_at(source: Source, path: Vec<LocSegment>, message: &str) -> ValidationError {
    let message = position_regex().replace(message, "").into_owned();
    let mut loc = Vec::with_capacity(path.len() + 2);
    loc.push(LocSegment::from(source.as_str()));
    loc.extend(path);
    if let Some(caps) = field_regex().captures(&message) {
        let field = caps.get(2).map_or("", |m| m.as_str()).to_owned();
        let (kind, msg) = match caps.get(1).map(|m| m.as_str()) {
            Some("missing") => ("missing", "Field required"),
            _ => ("extra_forbidden", "Extra inputs are not permitted"),
        };
        loc.push(LocSegment::from(field));
        return ValidationError::new(kind, loc, msg, Value::Null);
    }
    let kind = if message.starts_with("invalid type") {
        "invalid_type"
    } else {
        "value_error"
    };
    ValidationError::new(kind, loc, message.clone(), Value::Null).with_ctx("error", message)
}

fn loc_path(path: &serde_path_to_error::Path) -> Vec<LocSegment> {
    path.iter()
        .filter_map(|segment| match segment {
            Segment::Seq { index } => Some(LocSegment::from(*index)),
            Segment::Map { key } => Some(LocSegment::from(key.as_str())),
            Segment::Enum { variant } => Some(LocSegment::from(variant.as_str())),
            Segment::Unknown => None,
        })
        .collect()
}

fn json_syntax_error(error: &serde_json::Error) -> AppError {
    let reason = position_regex().replace(&error.to_string(), "").into_owned();
    AppError::validation(
        ValidationError::new(
            JSON_INVALID,
            [Source::Body.as_str()],
            "Invalid JSON",
            Value::Null,
        )
        .with_ctx("error", reason),
    )
}

/// Decode a JSON request body, locating data errors by field path.
///
/// # Errors
/// Syntax errors become a single `json_invalid` error; data errors are
/// classified by [`classify_message`] with `loc` rooted at `body`.
///
/// # Examples
/// ```
/// use admin_backend::domain::{AppError, LocSegment};
/// use admin_backend::inbound::http::validation::decode_json;
///
/// #[derive(Debug, serde::Deserialize)]
/// struct Body {
///     username: String,
/// }
///
/// let Err(AppError::Validation(errors)) = decode_json::<Body>(br#"{"username": 5}"#) else {
///     panic!("expected a validation failure");
/// };
/// assert_eq!(errors[0].loc, [LocSegment::from("body"), LocSegment::from("username")]);
/// ```
pub fn decode_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, AppError> {
    let mut deserializer = serde_json::Deserializer::from_slice(body);
    let value = serde_path_to_error::deserialize(&mut deserializer).map_err(|error| {
        let path = loc_path(error.path());
        let inner = error.into_inner();
        if inner.is_syntax() || inner.is_eof() {
            json_syntax_error(&inner)
        } else {
            AppError::validation(classify_at(Source::Body, path, &inner.to_string()))
        }
    })?;
    deserializer.end().map_err(|error| json_syntax_error(&error))?;
    Ok(value)
}

fn is_json(req: &HttpRequest) -> bool {
    let content_type = req.content_type();
    content_type == "application/json" || content_type.ends_with("+json")
}

/// JSON body extractor whose failures are [`AppError`]s located by path.
///
/// Requests must declare a JSON content type; anything else is an HTTP 415.
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

impl<T> JsonBody<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T: DeserializeOwned + 'static> FromRequest for JsonBody<T> {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        if !is_json(req) {
            return Box::pin(async {
                Err(AppError::http(415, "Content type must be application/json"))
            });
        }
        let body = web::Bytes::from_request(req, payload);
        Box::pin(async move {
            let body = body.await.map_err(|error| {
                AppError::http(
                    error.as_response_error().status_code().as_u16(),
                    error.to_string(),
                )
            })?;
            decode_json(&body).map(Self)
        })
    }
}

/// Map a query string failure.
#[must_use]
pub fn query_error(error: &QueryPayloadError) -> AppError {
    match error {
        QueryPayloadError::Deserialize(inner) => {
            AppError::validation(classify_message(Source::Query, &inner.to_string()))
        }
        other => AppError::http(400, other.to_string()),
    }
}

/// Map a path segment failure.
#[must_use]
pub fn path_error(error: &PathError) -> AppError {
    match error {
        PathError::Deserialize(inner) => {
            AppError::validation(classify_message(Source::Path, &inner.to_string()))
        }
        other => AppError::http(404, other.to_string()),
    }
}

/// Validation error for a domain newtype rejecting `input`.
#[must_use]
pub fn field_error(
    source: Source,
    field: &str,
    error: &UserValidationError,
    input: &str,
) -> ValidationError {
    let base = ValidationError::new(
        error.kind(),
        [source.as_str(), field],
        error.to_string(),
        json!(input),
    );
    match error {
        UserValidationError::EmptyId
        | UserValidationError::EmptyUsername
        | UserValidationError::EmptyAuditName => base.with_ctx("min_length", 1),
        UserValidationError::IdTooLong { max }
        | UserValidationError::UsernameTooLong { max }
        | UserValidationError::AuditNameTooLong { max } => base.with_ctx("max_length", *max),
        UserValidationError::InvalidId => base.with_ctx("pattern", "^[A-Za-z0-9]+$"),
        UserValidationError::UsernameInvalidCharacters => {
            base.with_ctx("pattern", r"^[\p{L}\p{N}_]+$")
        }
    }
}

/// Query extractor configuration routing failures through [`query_error`].
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|error, _req: &HttpRequest| query_error(&error).into())
}

/// Path extractor configuration routing failures through [`path_error`].
pub fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|error, _req: &HttpRequest| path_error(&error).into())
}
