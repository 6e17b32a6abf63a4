use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::config::AppConfig;

/// Type alias for the PostgreSQL connection pool
pub type DbPool = PgPool;

/// Creates and configures the PostgreSQL connection pool
///
/// # Arguments
/// * `config` - Application configuration (URL, pool size, acquire timeout)
///
/// # Returns
/// * `Result<DbPool>` - Configured connection pool or error
pub async fn create_pool(config: &AppConfig) -> Result<DbPool, sqlx::Error> {
    tracing::debug!(
        "Creating database connection pool (max_connections={})",
        config.db_max_connections
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(config.db_acquire_timeout())
        .connect(&config.database_url)
        .await?;

    tracing::info!("Database connection pool created successfully");
    Ok(pool)
}

/// Applies the embedded SQL migrations
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Migrations completed successfully");
    Ok(())
}
