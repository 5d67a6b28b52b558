//! HTTP server configuration object.

use admin_backend::outbound::persistence::DbPool;
use admin_backend::settings::Settings;

/// Everything the server needs beyond the route table.
pub struct ServerConfig {
    pub(crate) settings: Settings,
    pub(crate) db_pool: Option<DbPool>,
}

impl ServerConfig {
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            db_pool: None,
        }
    }

    /// Attach a pool so the Diesel repository replaces the in-memory one.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }
}
