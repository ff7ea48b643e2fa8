//! Available migrations.
//!
//! A registry is built once, either from a directory of migration files or
//! from in-memory definitions, and never changes afterwards.

mod loader;
mod sql;

pub use loader::{load_definitions_from_dir, parse_migration, DOWN_MARKER, UP_MARKER};
pub use sql::split_sql_statements;

use std::collections::BTreeMap;
use std::path::Path;

use migrator_core::error::{MigratorError, Result};
use migrator_core::migration::{MigrationDefinition, Version};

/// Immutable set of available migrations keyed by version.
#[derive(Debug, Clone, Default)]
pub struct MigrationRegistry {
    migrations: BTreeMap<Version, MigrationDefinition>,
}

impl MigrationRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from definitions. Fails on duplicate versions.
    pub fn from_definitions(
        definitions: impl IntoIterator<Item = MigrationDefinition>,
    ) -> Result<Self> {
        let mut migrations = BTreeMap::new();
        for definition in definitions {
            if migrations.contains_key(&definition.version) {
                return Err(MigratorError::Registry(format!(
                    "Duplicate migration version: {}",
                    definition.version
                )));
            }
            migrations.insert(definition.version.clone(), definition);
        }
        Ok(Self { migrations })
    }

    /// Scan a directory of migration files.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        Self::from_definitions(load_definitions_from_dir(dir)?)
    }

    /// All available versions in ascending order.
    pub fn list_available(&self) -> Vec<Version> {
        self.migrations.keys().cloned().collect()
    }

    /// Get a migration by version.
    pub fn get(&self, version: &Version) -> Result<&MigrationDefinition> {
        self.migrations
            .get(version)
            .ok_or_else(|| MigratorError::UnknownVersion(version.to_string()))
    }

    pub fn contains(&self, version: &Version) -> bool {
        self.migrations.contains_key(version)
    }

    /// Highest available version.
    pub fn latest(&self) -> Option<&Version> {
        self.migrations.keys().next_back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MigrationDefinition> {
        self.migrations.values()
    }

    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }
}
