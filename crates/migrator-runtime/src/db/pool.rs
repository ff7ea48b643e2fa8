use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::debug;

use migrator_core::config::DatabaseConfig;
use migrator_core::error::{MigratorError, Result};

/// Connection pool for the database a migration set targets.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
    config: DatabaseConfig,
}

impl Database {
    /// Connect using the `[database]` section of the configuration.
    pub async fn from_config(config: &DatabaseConfig) -> Result<Self> {
        if !config.has_url() {
            return Err(MigratorError::Config(
                "database.url is required to connect".to_string(),
            ));
        }

        let pool = Self::create_pool(&config.url, config.pool_size, config.pool_timeout())
            .await
            .map_err(|e| MigratorError::Database(format!("Failed to connect: {}", e)))?;
        debug!("Connected with a pool of {} connection(s)", config.pool_size);

        Ok(Self {
            pool,
            config: config.clone(),
        })
    }

    async fn create_pool(url: &str, size: u32, timeout: Duration) -> sqlx::Result<PgPool> {
        PgPoolOptions::new()
            .max_connections(size.max(1))
            .acquire_timeout(timeout)
            .connect(url)
            .await
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Statement timeout from the configuration, if any.
    pub fn statement_timeout(&self) -> Option<Duration> {
        self.config.statement_timeout()
    }

    /// Check database connectivity.
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| MigratorError::Database(format!("Health check failed: {}", e)))?;
        Ok(())
    }

    /// Close all connections gracefully.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
