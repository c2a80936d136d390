//! Database layer for the mawared platform.
//!
//! Provides `sqlx`/Postgres models, connection pool bootstrap, and embedded
//! migrations. Models expose inherent async methods generic over
//! `sqlx::Executor` so they work with pools, connections, and transactions.

pub mod error;
pub mod migrations;
pub mod models;

pub use error::DbError;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Default maximum connections for the shared pool.
const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Create a connection pool for the given database URL.
///
/// # Errors
///
/// Returns [`DbError::ConnectionFailed`] if the pool cannot be established.
pub async fn create_pool(database_url: &str) -> Result<PgPool, DbError> {
    PgPoolOptions::new()
        .max_connections(DEFAULT_MAX_CONNECTIONS)
        .connect(database_url)
        .await
        .map_err(DbError::ConnectionFailed)
}
