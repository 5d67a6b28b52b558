//! Request middleware.
//!
//! Purpose: request lifecycle concerns shared by every route. Mount order
//! matters: [`Trace`] outermost, then [`AccessLog`], then
//! [`ExceptionHandlers`] closest to the routes.

pub mod access_log;
pub mod exception_handlers;
pub mod trace;

pub use access_log::AccessLog;
pub use exception_handlers::{CapturedException, ExceptionHandlers};
pub use trace::Trace;
