//! Embedded database migrations.

use sqlx::PgPool;

use crate::error::DbError;

/// Run all pending migrations against the given pool.
///
/// # Errors
///
/// Returns [`DbError::MigrationFailed`] if a migration cannot be applied.
pub async fn run_migrations(pool: &PgPool) -> Result<(), DbError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(DbError::MigrationFailed)?;

    tracing::info!(target: "db", "Database migrations applied");
    Ok(())
}
