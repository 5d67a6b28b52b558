//! Embedded schema migrations for `sys_user`.
//!
//! Migrations run over a synchronous `PgConnection` on a blocking thread so
//! the async runtime is never stalled by DDL.

use diesel::Connection;
use diesel::pg::PgConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::info;

/// Migrations compiled from `backend/migrations`.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Errors raised while applying or reverting migrations.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("failed to connect for migrations: {message}")]
    Connect { message: String },
    #[error("migration failed: {message}")]
    Apply { message: String },
    #[error("no migration to revert")]
    NothingToRevert,
    #[error("migration task panicked: {message}")]
    Join { message: String },
}

fn connect(database_url: &str) -> Result<PgConnection, MigrationError> {
    PgConnection::establish(database_url).map_err(|err| MigrationError::Connect {
        message: err.to_string(),
    })
}

fn apply_pending(database_url: &str) -> Result<Vec<String>, MigrationError> {
    let mut conn = connect(database_url)?;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|err| MigrationError::Apply {
            message: err.to_string(),
        })?;
    Ok(applied.iter().map(ToString::to_string).collect())
}

fn revert(database_url: &str) -> Result<String, MigrationError> {
    let mut conn = connect(database_url)?;
    let applied = conn
        .applied_migrations()
        .map_err(|err| MigrationError::Apply {
            message: err.to_string(),
        })?;
    if applied.is_empty() {
        return Err(MigrationError::NothingToRevert);
    }
    conn.revert_last_migration(MIGRATIONS)
        .map(|version| version.to_string())
        .map_err(|err| MigrationError::Apply {
            message: err.to_string(),
        })
}

async fn blocking<T, F>(task: F) -> Result<T, MigrationError>
where
    F: FnOnce() -> Result<T, MigrationError> + Send + 'static,
    T: Send + 'static,
{
    actix_web::rt::task::spawn_blocking(task)
        .await
        .map_err(|err| MigrationError::Join {
            message: err.to_string(),
        })?
}

/// Apply every pending migration, returning the applied versions.
///
/// # Errors
///
/// Fails when the database is unreachable or a migration errors.
pub async fn run_pending(database_url: &str) -> Result<Vec<String>, MigrationError> {
    let url = database_url.to_owned();
    let applied = blocking(move || apply_pending(&url)).await?;
    info!(count = applied.len(), versions = ?applied, "applied migrations");
    Ok(applied)
}

/// Revert the most recently applied migration, returning its version.
///
/// # Errors
///
/// Fails when nothing has been applied, the database is unreachable or the
/// down script errors.
pub async fn revert_last(database_url: &str) -> Result<String, MigrationError> {
    let url = database_url.to_owned();
    let version = blocking(move || revert(&url)).await?;
    info!(%version, "reverted migration");
    Ok(version)
}
