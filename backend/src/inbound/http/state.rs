//! Shared HTTP adapter state.
//!
//! Handlers accept [`State`] rather than `web::Data<HttpState>` so a missing
//! registration surfaces as a usage failure in the error envelope instead of
//! the framework's plain-text 500.

use std::ops::Deref;
use std::sync::Arc;

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest, web};
use futures_util::future::{Ready, ready};
use tracing::error;

use crate::domain::{AppError, TimeZone, UsageErrorCode, UserService};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub users: Arc<UserService>,
    /// Zone used to parse query datetimes and render response timestamps.
    pub timezone: TimeZone,
}

impl HttpState {
    /// Construct state from the user service and configured zone.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use admin_backend::domain::ports::FixtureUserRepository;
    /// use admin_backend::domain::{TimeZone, UserService};
    /// use admin_backend::inbound::http::state::HttpState;
    /// use mockable::DefaultClock;
    ///
    /// let service = UserService::new(
    ///     Arc::new(FixtureUserRepository::default()),
    ///     Arc::new(DefaultClock),
    /// );
    /// let state = HttpState::new(Arc::new(service), TimeZone::default());
    /// assert_eq!(state.timezone.tz().name(), "Asia/Shanghai");
    /// ```
    #[must_use]
    pub fn new(users: Arc<UserService>, timezone: TimeZone) -> Self {
        Self { users, timezone }
    }
}

/// Extractor for the registered [`HttpState`].
pub struct State(web::Data<HttpState>);

impl Deref for State {
    type Target = HttpState;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequest for State {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<HttpState>>().cloned();
        ready(state.map(Self).ok_or_else(|| {
            error!(path = %req.path(), "HttpState is not registered as app data");
            UsageErrorCode::MissingAppState.into()
        }))
    }
}
