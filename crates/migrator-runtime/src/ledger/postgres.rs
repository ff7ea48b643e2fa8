use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use sqlx::{PgPool, Row};
use tracing::debug;

use migrator_core::error::{MigratorError, Result};
use migrator_core::migration::{Direction, Version, VersionLedger};

/// Ledger stored in a PostgreSQL table, one row per executed version.
///
/// Every write is a single autocommitted statement, so it is durable once the
/// future resolves.
#[derive(Debug, Clone)]
pub struct PgLedger {
    pool: PgPool,
    table: String,
}

impl PgLedger {
    /// Create a ledger over `table`. Call [`PgLedger::init`] before use.
    pub fn new(pool: PgPool, table: impl Into<String>) -> Self {
        Self {
            pool,
            table: table.into(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Create the ledger table if it does not exist.
    pub async fn init(&self) -> Result<()> {
        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                version VARCHAR(255) PRIMARY KEY,
                executed_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
            quote_ident(&self.table)
        ))
        .execute(&self.pool)
        .await
        .map_err(|e| MigratorError::Database(format!("Failed to init ledger table: {}", e)))?;

        debug!("Ledger table {} ready", self.table);
        Ok(())
    }
}

impl VersionLedger for PgLedger {
    fn record_applied<'a>(&'a self, version: &'a Version) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let result = sqlx::query(&format!(
                "INSERT INTO {} (version) VALUES ($1) ON CONFLICT (version) DO NOTHING",
                quote_ident(&self.table)
            ))
            .bind(version.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                MigratorError::Database(format!("Failed to record version {}: {}", version, e))
            })?;

            if result.rows_affected() == 0 {
                return Err(MigratorError::DuplicateVersion(version.clone()));
            }
            Ok(())
        })
    }

    fn record_reverted<'a>(&'a self, version: &'a Version) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let result = sqlx::query(&format!(
                "DELETE FROM {} WHERE version = $1",
                quote_ident(&self.table)
            ))
            .bind(version.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                MigratorError::Database(format!("Failed to remove version {}: {}", version, e))
            })?;

            if result.rows_affected() == 0 {
                return Err(MigratorError::NotFound(version.clone()));
            }
            Ok(())
        })
    }

    fn list_executed(&self) -> BoxFuture<'_, Result<BTreeMap<Version, DateTime<Utc>>>> {
        Box::pin(async move {
            let rows = sqlx::query(&format!(
                "SELECT version, executed_at FROM {} ORDER BY version ASC",
                quote_ident(&self.table)
            ))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| MigratorError::Database(format!("Failed to fetch ledger: {}", e)))?;

            let mut executed = BTreeMap::new();
            for row in rows {
                let version: String = row.try_get("version")?;
                let executed_at: DateTime<Utc> = row.try_get("executed_at")?;
                executed.insert(Version::new(version), executed_at);
            }
            Ok(executed)
        })
    }

    fn timestamp_of<'a>(&'a self, version: &'a Version) -> BoxFuture<'a, Result<DateTime<Utc>>> {
        Box::pin(async move {
            sqlx::query_scalar::<_, DateTime<Utc>>(&format!(
                "SELECT executed_at FROM {} WHERE version = $1",
                quote_ident(&self.table)
            ))
            .bind(version.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| MigratorError::Database(format!("Failed to read ledger: {}", e)))?
            .ok_or_else(|| MigratorError::NotFound(version.clone()))
        })
    }

    fn script_statement(&self, version: &Version, direction: Direction) -> Option<String> {
        let table = quote_ident(&self.table);
        let version = quote_literal(version.as_str());
        Some(match direction {
            Direction::Up => format!(
                "INSERT INTO {} (version, executed_at) VALUES ({}, NOW());",
                table, version
            ),
            Direction::Down => format!("DELETE FROM {} WHERE version = {};", table, version),
        })
    }
}

fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Queries need a live PostgreSQL; only the pure helpers are covered here.

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("app_migrations"), "\"app_migrations\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn test_quote_literal() {
        assert_eq!(quote_literal("20240101"), "'20240101'");
        assert_eq!(quote_literal("o'clock"), "'o''clock'");
    }

    #[tokio::test]
    async fn test_script_statements() {
        let pool = PgPool::connect_lazy("postgres://localhost/unused").unwrap();
        let ledger = PgLedger::new(pool, "app_migrations");
        let version = Version::new("20240101000000");

        assert_eq!(
            ledger.script_statement(&version, Direction::Up).unwrap(),
            "INSERT INTO \"app_migrations\" (version, executed_at) VALUES ('20240101000000', NOW());"
        );
        assert_eq!(
            ledger.script_statement(&version, Direction::Down).unwrap(),
            "DELETE FROM \"app_migrations\" WHERE version = '20240101000000';"
        );
    }
}
