//! PostgreSQL persistence for the G Coin ledger.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - Database migrations
//! - [`PgLedgerStore`], the PostgreSQL Ledger Store

pub mod entities;
pub mod migration;
pub mod store;

pub use store::{PgLedgerStore, PgUnit, map_db_err};

use std::time::Duration;

use gcoin_shared::config::DatabaseConfig;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Establishes a pooled connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(5))
        .sqlx_logging(false);
    Database::connect(options).await
}
