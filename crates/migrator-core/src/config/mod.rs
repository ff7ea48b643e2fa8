mod database;
mod migration_set;

pub use database::DatabaseConfig;
pub use migration_set::{MigrationOwner, MigrationSetConfig, MIGRATIONS_DIR_NAME};

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{MigratorError, Result};

static ENV_VAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("valid env var pattern"));

/// Root configuration, usually loaded from `migrator.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigratorConfig {
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// The migration set to manage.
    pub migrations: MigrationSetConfig,
}

impl MigratorConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| MigratorError::Config(format!("Failed to read config file: {}", e)))?;

        Self::parse_toml(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse_toml(content: &str) -> Result<Self> {
        let content = substitute_env_vars(content);

        let config: Self = toml::from_str(&content)
            .map_err(|e| MigratorError::Config(format!("Failed to parse config: {}", e)))?;
        config.migrations.validate()?;
        Ok(config)
    }

    /// Configuration for a migration set with default database settings.
    pub fn new(database_url: &str, migrations: MigrationSetConfig) -> Self {
        Self {
            database: DatabaseConfig {
                url: database_url.to_string(),
                ..Default::default()
            },
            migrations,
        }
    }
}

/// Substitute environment variables in the format ${VAR_NAME}.
fn substitute_env_vars(content: &str) -> String {
    let mut result = content.to_string();

    for cap in ENV_VAR.captures_iter(content) {
        let var_name = &cap[1];
        if let Ok(value) = std::env::var(var_name) {
            result = result.replace(&cap[0], &value);
        }
    }

    result
}
