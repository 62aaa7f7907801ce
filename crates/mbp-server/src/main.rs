//! MBP Server - Main entry point

use anyhow::Result;
use mbp_common::logging::{init_logging, LogConfig};
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;
use tracing::info;

use mbp_server::{api, config::Config, store::PgDatasetStore};

#[tokio::main]
async fn main() -> Result<()> {
    let log_config = LogConfig::from_env().unwrap_or_else(|_| {
        LogConfig::default()
            .with_prefix("mbp-server")
            .with_filter("mbp_server=debug,tower_http=debug,sqlx=info")
    });
    init_logging(&log_config)?;

    info!("Starting MBP Server");

    let config = Config::load()?;
    info!(
        "Configuration loaded - server will bind to {}:{}",
        config.server.host, config.server.port
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(Duration::from_secs(config.database.connect_timeout_secs))
        .connect(&config.database.url)
        .await?;
    info!("Database connection pool established");

    sqlx::migrate!("../../migrations")
        .run(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to run migrations: {}", e))?;
    info!("Database migrations completed");

    api::serve(config, PgDatasetStore::new(pool)).await
}
