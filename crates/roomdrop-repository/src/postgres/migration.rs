//! Database migration runner.

use sqlx::PgPool;
use tracing::info;

use roomdrop_core::{ShareError, ShareResult};

/// Run all pending database migrations.
pub async fn run_migrations(pool: &PgPool) -> ShareResult<()> {
    info!("Running database migrations...");

    sqlx::migrate!("../../migrations")
        .run(pool)
        .await
        .map_err(|e| ShareError::database(format!("Failed to run migrations: {e}"), e))?;

    info!("Database migrations completed successfully");
    Ok(())
}
