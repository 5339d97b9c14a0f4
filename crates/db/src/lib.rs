//! Persistence for quorum.
//!
//! Five tables back the Q&A engine: `user`, `question`, `answer`, `vote`
//! and `answer_comment`. Entities mirror them one to one, and repositories
//! wrap the queries the services need, including the locked reads and
//! counter updates the voting engine runs inside a transaction.

pub mod entities;
pub mod migrations;
pub mod repositories;
pub mod test_utils;

use quorum_common::{AppError, Config};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::time::Duration;
use tracing::log::LevelFilter;

/// Pool settings derived from the `[database]` section.
#[must_use]
pub fn connect_options(config: &Config) -> ConnectOptions {
    let mut opt = ConnectOptions::new(&config.database.url);
    opt.max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections.min(config.database.max_connections))
        .connect_timeout(Duration::from_secs(10))
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(600))
        .sqlx_logging(true)
        .sqlx_logging_level(LevelFilter::Debug);
    opt
}

/// Open the connection pool.
pub async fn init(config: &Config) -> Result<DatabaseConnection, AppError> {
    Database::connect(connect_options(config))
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}

/// Bring the schema up to date.
pub async fn migrate(db: &DatabaseConnection) -> Result<(), AppError> {
    use sea_orm_migration::MigratorTrait;
    migrations::Migrator::up(db, None)
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}
