//! Failure taxonomy shared by every request handler.
//!
//! These errors describe *what* went wrong. The HTTP adapter decides how each
//! kind is rendered (status code, verbosity, trace identifier).

use std::fmt;
use std::future::Future;
use std::sync::Mutex;

use futures_util::future::BoxFuture;
use serde_json::Value;

use super::ValidationError;

/// Message used when an assertion carries no text of its own.
pub const ASSERTION_FAILED: &str = "Assertion failed.";

/// Coarse failure category, recorded alongside the rendered content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExceptionKind {
    Http,
    Validation,
    Usage,
    Assertion,
    Custom,
    Unknown,
}

impl ExceptionKind {
    /// Stable label used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http_exception",
            Self::Validation => "validation_error",
            Self::Usage => "usage_error",
            Self::Assertion => "assertion_error",
            Self::Custom => "custom_exception",
            Self::Unknown => "unknown_exception",
        }
    }
}

/// Framework misconfiguration detected while serving a request.
///
/// The message table is total: every code has a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum UsageErrorCode {
    /// Handler state was not registered on the application.
    MissingAppState,
}

impl UsageErrorCode {
    /// Client-facing message for this code.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::MissingAppState => "Service state is not configured; contact the administrator",
        }
    }
}

/// Deferred work attached to a [`CustomError`], run once its response is built.
pub struct BackgroundTask(Mutex<Option<BoxFuture<'static, ()>>>);

impl BackgroundTask {
    pub fn new<F>(task: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self(Mutex::new(Some(Box::pin(task))))
    }

    /// Take the task out; later calls return `None`.
    pub fn take(&self) -> Option<BoxFuture<'static, ()>> {
        self.0.lock().ok().and_then(|mut slot| slot.take())
    }
}

impl fmt::Debug for BackgroundTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pending = self.0.lock().map(|slot| slot.is_some()).unwrap_or(false);
        f.debug_struct("BackgroundTask")
            .field("pending", &pending)
            .finish()
    }
}

/// Application-defined failure that carries its own code, message and data.
///
/// # Examples
/// ```
/// use admin_backend::domain::CustomError;
/// use serde_json::json;
///
/// let err = CustomError::new(40401, "User not found").with_data(json!({"id": "42"}));
/// assert_eq!(err.code(), 40401);
/// assert_eq!(err.msg(), "User not found");
/// ```
#[derive(Debug)]
pub struct CustomError {
    code: i64,
    msg: String,
    data: Option<Value>,
    background: Option<BackgroundTask>,
}

impl CustomError {
    pub fn new(code: i64, msg: impl Into<String>) -> Self {
        Self {
            code,
            msg: msg.into(),
            data: None,
            background: None,
        }
    }

    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Run `task` after the error response has been produced.
    #[must_use]
    pub fn with_background<F>(mut self, task: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.background = Some(BackgroundTask::new(task));
        self
    }

    pub fn code(&self) -> i64 {
        self.code
    }

    pub fn msg(&self) -> &str {
        &self.msg
    }

    /// Data for the response; empty values collapse to `None`.
    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref().filter(|value| is_truthy(value))
    }

    pub fn background(&self) -> Option<&BackgroundTask> {
        self.background.as_ref()
    }
}

impl fmt::Display for CustomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.msg)
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Every failure a request handler can raise.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Protocol-level failure with an explicit status.
    #[error("{detail}")]
    Http {
        status: u16,
        detail: String,
        headers: Vec<(String, String)>,
    },
    /// Request data failed validation.
    #[error("request validation failed with {} error(s)", .0.len())]
    Validation(Vec<ValidationError>),
    /// The service itself is misconfigured.
    #[error("{}", .0.message())]
    Usage(UsageErrorCode),
    /// An internal invariant did not hold.
    #[error("{}", .message.as_deref().unwrap_or(ASSERTION_FAILED))]
    Assertion { message: Option<String> },
    /// Application-defined failure rendered verbatim.
    #[error("{0}")]
    Custom(CustomError),
    /// Anything else.
    #[error("{0}")]
    Unknown(Box<dyn std::error::Error + Send + Sync>),
}

impl AppError {
    /// HTTP exception without extra headers.
    pub fn http(status: u16, detail: impl Into<String>) -> Self {
        Self::Http {
            status,
            detail: detail.into(),
            headers: Vec::new(),
        }
    }

    /// Single validation failure.
    pub fn validation(error: ValidationError) -> Self {
        Self::Validation(vec![error])
    }

    /// Assertion failure with a message.
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::Assertion {
            message: Some(message.into()),
        }
    }

    /// Wrap any error as an unknown failure.
    pub fn unknown<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::Unknown(error.into())
    }

    /// Category used for logging.
    #[must_use]
    pub fn kind(&self) -> ExceptionKind {
        match self {
            Self::Http { .. } => ExceptionKind::Http,
            Self::Validation(_) => ExceptionKind::Validation,
            Self::Usage(_) => ExceptionKind::Usage,
            Self::Assertion { .. } => ExceptionKind::Assertion,
            Self::Custom(_) => ExceptionKind::Custom,
            Self::Unknown(_) => ExceptionKind::Unknown,
        }
    }

    /// Detach the background task of a custom failure, if any.
    pub fn take_background(&self) -> Option<BoxFuture<'static, ()>> {
        match self {
            Self::Custom(custom) => custom.background().and_then(BackgroundTask::take),
            _ => None,
        }
    }
}

impl From<CustomError> for AppError {
    fn from(value: CustomError) -> Self {
        Self::Custom(value)
    }
}

impl From<UsageErrorCode> for AppError {
    fn from(value: UsageErrorCode) -> Self {
        Self::Usage(value)
    }
}

/// Return an assertion failure unless `condition` holds.
///
/// # Examples
/// ```
/// use admin_backend::domain::{ensure, AppError};
///
/// assert!(ensure(true, "unreachable").is_ok());
/// assert!(matches!(ensure(false, "boom"), Err(AppError::Assertion { .. })));
/// ```
pub fn ensure(condition: bool, message: impl Into<String>) -> Result<(), AppError> {
    if condition {
        Ok(())
    } else {
        Err(AppError::assertion(message))
    }
}
