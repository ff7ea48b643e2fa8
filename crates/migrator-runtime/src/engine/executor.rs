use std::time::Duration;

use futures::future::BoxFuture;
use sqlx::PgPool;
use tracing::debug;

use migrator_core::error::{MigratorError, Result};
use migrator_core::migration::{Direction, MigrationDefinition, StepExecutor};

use crate::registry::split_sql_statements;

/// Runs migration SQL against PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgExecutor {
    pool: PgPool,
    /// Wrap each step in a transaction.
    transactional: bool,
    statement_timeout: Option<Duration>,
}

impl PgExecutor {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            transactional: true,
            statement_timeout: None,
        }
    }

    /// Run each step inside its own transaction (the default). Disable for
    /// migrations with statements that cannot run in a transaction.
    pub fn transactional(mut self, transactional: bool) -> Self {
        self.transactional = transactional;
        self
    }

    /// Fail a statement that runs longer than `timeout`.
    pub fn statement_timeout(mut self, timeout: Duration) -> Self {
        self.statement_timeout = Some(timeout);
        self
    }

    async fn run_statements(&self, version: &str, statements: Vec<String>) -> Result<()> {
        if self.transactional {
            let mut tx = self.pool.begin().await.map_err(|e| {
                MigratorError::Database(format!("Failed to start transaction: {}", e))
            })?;
            for statement in &statements {
                self.run_one(&mut *tx, version, statement).await?;
            }
            tx.commit().await.map_err(|e| {
                MigratorError::Database(format!("Failed to commit migration {}: {}", version, e))
            })?;
        } else {
            let mut conn = self.pool.acquire().await.map_err(|e| {
                MigratorError::Database(format!("Failed to acquire connection: {}", e))
            })?;
            for statement in &statements {
                self.run_one(&mut *conn, version, statement).await?;
            }
        }
        Ok(())
    }

    async fn run_one(
        &self,
        conn: &mut sqlx::PgConnection,
        version: &str,
        statement: &str,
    ) -> Result<()> {
        debug!("Executing statement for {}: {}", version, statement);

        let query = sqlx::query(statement).execute(conn);
        let result = match self.statement_timeout {
            Some(timeout) => tokio::time::timeout(timeout, query).await.map_err(|_| {
                MigratorError::Database(format!(
                    "Statement timed out after {}s in migration {}",
                    timeout.as_secs(),
                    version
                ))
            })?,
            None => query.await,
        };

        result.map_err(|e| {
            MigratorError::Database(format!("Failed to apply migration {}: {}", version, e))
        })?;
        Ok(())
    }
}

impl StepExecutor for PgExecutor {
    fn execute<'a>(
        &'a self,
        migration: &'a MigrationDefinition,
        direction: Direction,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let sql = migration
                .sql(direction)
                .ok_or_else(|| MigratorError::Irreversible(migration.version.clone()))?;

            self.run_statements(migration.version.as_str(), split_sql_statements(sql))
                .await
        })
    }
}
