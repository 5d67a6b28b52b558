//! Uniform response envelopes.
//!
//! Successful handlers answer with [`ApiResponse`]; every failure is rendered
//! as an [`ErrorEnvelope`] carrying the request's trace identifier.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Code/message pair shared by the success and failure envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseCode {
    /// HTTP-status-like integer code.
    pub code: i64,
    /// Message paired with the code.
    pub msg: &'static str,
}

impl ResponseCode {
    pub const SUCCESS: Self = Self::new(200, "Success");
    pub const HTTP_400: Self = Self::new(400, "Bad request");
    pub const HTTP_422: Self = Self::new(422, "Invalid request parameters");
    pub const HTTP_500: Self = Self::new(500, "Internal server error");

    const fn new(code: i64, msg: &'static str) -> Self {
        Self { code, msg }
    }
}

/// Error payload before the trace identifier is attached.
///
/// This is also what the exception registry stores in the request extensions
/// for the access log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorContent {
    pub code: i64,
    pub msg: String,
    pub data: Option<Value>,
}

impl ErrorContent {
    /// Build content with no data.
    pub fn new(code: i64, msg: impl Into<String>) -> Self {
        Self {
            code,
            msg: msg.into(),
            data: None,
        }
    }

    /// Generic content for a well-known code.
    #[must_use]
    pub fn fail(res: ResponseCode) -> Self {
        Self::new(res.code, res.msg)
    }

    /// Attach structured data.
    #[must_use]
    pub fn with_data(mut self, data: Option<Value>) -> Self {
        self.data = data;
        self
    }

    /// Finalise into the wire envelope.
    pub fn with_trace_id(self, trace_id: impl Into<String>) -> ErrorEnvelope {
        ErrorEnvelope {
            code: self.code,
            msg: self.msg,
            data: self.data,
            trace_id: trace_id.into(),
        }
    }
}

/// Error response body returned for every failed request.
///
/// `data` is always serialised, as `null` when absent.
///
/// # Examples
/// ```
/// use admin_backend::domain::{ErrorContent, ResponseCode};
///
/// let envelope = ErrorContent::fail(ResponseCode::HTTP_500).with_trace_id("-");
/// let json = serde_json::to_value(&envelope).expect("serialise envelope");
/// assert_eq!(json["data"], serde_json::Value::Null);
/// assert_eq!(json["trace_id"], "-");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ErrorEnvelope {
    /// HTTP-status-like code, or an application code for custom failures.
    #[schema(example = 422)]
    pub code: i64,
    /// Human-readable message.
    #[schema(example = "Invalid request parameters: username field required")]
    pub msg: String,
    /// Failure details; only populated in development or by application errors.
    #[schema(value_type = Option<Object>)]
    pub data: Option<Value>,
    /// Correlation identifier taken from the request header.
    #[schema(example = "-")]
    pub trace_id: String,
}

/// Success response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    #[schema(example = 200)]
    pub code: i64,
    #[schema(example = "Success")]
    pub msg: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Wrap `data` in a success envelope.
    pub fn success(data: T) -> Self {
        Self {
            code: ResponseCode::SUCCESS.code,
            msg: ResponseCode::SUCCESS.msg.to_owned(),
            data: Some(data),
        }
    }
}
