//! Backend entry-point: serves the admin API or manages schema migrations.

mod server;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Context, Result, eyre};
use mockable::DefaultEnv;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

use admin_backend::outbound::persistence::{DbPool, PoolConfig, migrations};
use admin_backend::settings::{BuildMode, Settings};
use server::{ServerConfig, create_server};

/// `admin-backend` command arguments.
#[derive(Debug, Parser)]
#[command(name = "admin-backend", about = "System user administration API", version)]
struct CliArgs {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Clone, Copy, Subcommand)]
enum Command {
    /// Serve the HTTP API (default).
    Serve,
    /// Apply pending schema migrations.
    Migrate,
    /// Revert the most recently applied migration.
    Rollback,
}

#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let args = CliArgs::parse();
    let settings = Settings::from_env(&DefaultEnv::new(), BuildMode::from_debug_assertions())
        .wrap_err("invalid settings")?;

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(settings).await,
        Command::Migrate => {
            let url = require_database_url(&settings)?;
            migrations::run_pending(url)
                .await
                .wrap_err("failed to apply migrations")?;
            Ok(())
        }
        Command::Rollback => {
            let url = require_database_url(&settings)?;
            migrations::revert_last(url)
                .await
                .wrap_err("failed to revert migration")?;
            Ok(())
        }
    }
}

fn require_database_url(settings: &Settings) -> Result<&str> {
    settings
        .database_url
        .as_deref()
        .ok_or_else(|| eyre!("DATABASE_URL must be set to manage migrations"))
}

async fn serve(settings: Settings) -> Result<()> {
    let mut config = ServerConfig::new(settings.clone());
    if let Some(url) = settings.database_url.as_deref() {
        let pool = DbPool::connect(PoolConfig::new(url))
            .await
            .wrap_err("failed to create database pool")?;
        config = config.with_db_pool(pool);
    }
    create_server(config)
        .wrap_err_with(|| format!("failed to bind {}", settings.bind_addr))?
        .await
        .wrap_err("server terminated with an error")
}
