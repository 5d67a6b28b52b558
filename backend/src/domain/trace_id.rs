//! Request-scoped trace identifier for correlation across logs and errors.
//!
//! The identifier is read from a configured request header, falling back to a
//! configured default when the header is absent. It is held in task-local
//! storage so error rendering and logging can reach it without parameter
//! threading.
//!
//! Tokio task-local variables are not inherited across spawned tasks. Use
//! [`TraceId::scope`] when spawning new tasks so the active identifier
//! propagates.

use std::future::Future;
use std::sync::Arc;

use tokio::task_local;

/// Header read when none is configured.
pub const DEFAULT_TRACE_ID_HEADER: &str = "X-Request-ID";
/// Value used when the request carries no trace header.
pub const DEFAULT_TRACE_ID: &str = "-";

task_local! {
    static TRACE_ID: TraceId;
}

/// Per-request correlation identifier.
///
/// # Examples
/// ```
/// use admin_backend::domain::TraceId;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let trace_id = TraceId::new("req-42");
/// let observed = TraceId::scope(trace_id.clone(), async { TraceId::current() }).await;
/// assert_eq!(observed, Some(trace_id));
/// # });
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TraceId(Arc<str>);

impl TraceId {
    pub fn new(value: impl Into<Arc<str>>) -> Self {
        Self(value.into())
    }

    /// Header value when present, otherwise `default`.
    ///
    /// An empty header value counts as absent.
    #[must_use]
    pub fn from_header(value: Option<&str>, default: &str) -> Self {
        match value.filter(|v| !v.is_empty()) {
            Some(v) => Self::new(v),
            None => Self::new(default),
        }
    }

    /// Returns the current trace identifier if one is in scope.
    #[must_use]
    #[rustfmt::skip]
    pub fn current() -> Option<Self> { TRACE_ID.try_with(Clone::clone).ok() }

    /// Execute the provided future with the supplied trace identifier in scope.
    pub async fn scope<Fut>(trace_id: TraceId, fut: Fut) -> Fut::Output
    where
        Fut: Future,
    {
        TRACE_ID.scope(trace_id, fut).await
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TraceId {
    fn default() -> Self {
        Self::new(DEFAULT_TRACE_ID)
    }
}

impl std::fmt::Display for TraceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<TraceId> for String {
    fn from(value: TraceId) -> Self {
        value.0.as_ref().to_owned()
    }
}
