//! `bb8` pool of `diesel-async` connections shared by the `sys_user` adapter.
//!
//! [`DbPool::connect`] opens one connection before returning, so a wrong
//! `DATABASE_URL` fails at startup instead of on the first request.

use std::time::Duration;

use diesel_async::AsyncPgConnection;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::bb8::{Pool, PooledConnection};
use tracing::info;

use crate::domain::ports::UserPersistenceError;

const DEFAULT_MAX_SIZE: u32 = 10;
const DEFAULT_CHECKOUT_TIMEOUT: Duration = Duration::from_secs(30);

/// Pool construction and checkout failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    /// The initial connection to the database could not be opened.
    #[error("cannot reach database: {message}")]
    Connect { message: String },
    /// No connection became free before the checkout timeout.
    #[error("no database connection available: {message}")]
    Checkout { message: String },
}

impl From<PoolError> for UserPersistenceError {
    fn from(error: PoolError) -> Self {
        match error {
            PoolError::Connect { message } | PoolError::Checkout { message } => {
                Self::connection(message)
            }
        }
    }
}

/// Where to connect and how many connections to keep.
///
/// # Examples
/// ```
/// use std::time::Duration;
///
/// use admin_backend::outbound::persistence::PoolConfig;
///
/// let config = PoolConfig::new("postgres://localhost/admin")
///     .with_max_size(4)
///     .with_checkout_timeout(Duration::from_secs(5));
/// assert_eq!(config.database_url(), "postgres://localhost/admin");
/// assert_eq!(config.max_size(), 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    database_url: String,
    max_size: u32,
    checkout_timeout: Duration,
}

impl PoolConfig {
    /// Ten connections with a 30 second checkout timeout.
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_size: DEFAULT_MAX_SIZE,
            checkout_timeout: DEFAULT_CHECKOUT_TIMEOUT,
        }
    }

    /// Values below one are raised to one.
    #[must_use]
    pub fn with_max_size(mut self, max_size: u32) -> Self {
        self.max_size = max_size.max(1);
        self
    }

    #[must_use]
    pub fn with_checkout_timeout(mut self, timeout: Duration) -> Self {
        self.checkout_timeout = timeout;
        self
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub fn max_size(&self) -> u32 {
        self.max_size
    }
}

/// Cloneable handle to the connection pool.
#[derive(Clone)]
pub struct DbPool {
    inner: Pool<AsyncPgConnection>,
}

impl DbPool {
    /// Build the pool and check out one connection.
    ///
    /// # Errors
    /// [`PoolError::Connect`] when the first connection cannot be opened.
    pub async fn connect(config: PoolConfig) -> Result<Self, PoolError> {
        let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(config.database_url);
        let inner = Pool::builder()
            .max_size(config.max_size)
            .min_idle(Some(1))
            .connection_timeout(config.checkout_timeout)
            .build(manager)
            .await
            .map_err(|err| PoolError::Connect {
                message: err.to_string(),
            })?;
        drop(inner.get().await.map_err(|err| PoolError::Connect {
            message: err.to_string(),
        })?);
        info!(
            max_size = config.max_size,
            checkout_timeout_ms = config.checkout_timeout.as_millis(),
            "database pool ready"
        );
        Ok(Self { inner })
    }

    /// Check out a connection.
    ///
    /// # Errors
    /// [`PoolError::Checkout`] when none frees up within the timeout.
    pub async fn get(&self) -> Result<PooledConnection<'_, AsyncPgConnection>, PoolError> {
        self.inner.get().await.map_err(|err| PoolError::Checkout {
            message: err.to_string(),
        })
    }
}
