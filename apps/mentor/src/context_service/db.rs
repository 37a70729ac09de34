use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

/// Creates and returns a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
        .context("Failed to connect to PostgreSQL")?;

    info!("PostgreSQL connection pool established ({max_connections} connections max)");
    Ok(pool)
}

/// Applies the embedded migrations under `apps/mentor/migrations`.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("Failed to run database migrations")?;
    info!("Database migrations applied");
    Ok(())
}
