//! Domain primitives, failure taxonomy and `sys_user` use-cases.
//!
//! Purpose: keep request-independent rules (error envelopes, validation
//! messages, time zones, trace identifiers, users) free of HTTP and database
//! concerns. Adapters under `inbound` and `outbound` translate at the edges.
//!
//! Public surface:
//! - `AppError` and friends: every failure a handler can raise.
//! - `ErrorEnvelope`: the JSON body returned for every failure.
//! - `TimeZone`: the configured IANA zone helper.
//! - `TraceId`: the request correlation identifier.
//! - `SysUser` and `UserService`: the `sys_user` model and its use-cases.

pub mod environment;
pub mod error;
pub mod ports;
pub mod response;
pub mod timezone;
pub mod trace_id;
pub mod user;
pub mod user_service;
pub mod validation;

pub use self::environment::Environment;
pub use self::error::{
    ASSERTION_FAILED, AppError, BackgroundTask, CustomError, ExceptionKind, UsageErrorCode, ensure,
};
pub use self::response::{ApiResponse, ErrorContent, ErrorEnvelope, ResponseCode};
pub use self::timezone::{TimeZone, TimeZoneError};
pub use self::trace_id::TraceId;
pub use self::user::{AuditName, SysUser, UserId, UserValidationError, Username};
pub use self::user_service::{CreateUser, UserListFilter, UserService};
pub use self::validation::{LocSegment, ValidationError};
