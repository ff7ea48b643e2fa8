use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{MigratorError, Result};
use crate::migration::normalize_name;

/// Name of the directory, under the owner's path, that holds migrations.
pub const MIGRATIONS_DIR_NAME: &str = "Migrations";

/// Something that owns a set of migrations, such as an application module.
pub trait MigrationOwner {
    /// Owner name, normalized into the ledger table name.
    fn name(&self) -> &str;
    /// Root path of the owner; migrations live in its `Migrations` directory.
    fn path(&self) -> &Path;
    /// Namespace rendered into scaffolded migrations.
    fn namespace(&self) -> &str;
}

/// Configuration of one named migration set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationSetConfig {
    /// Migration set name.
    pub name: String,

    /// Root path of the owner.
    pub path: PathBuf,

    /// Owning namespace identifier.
    pub namespace: String,

    /// Scaffold template file. The built-in template is used when unset.
    #[serde(default)]
    pub template: Option<PathBuf>,

    /// Run each step inside its own transaction.
    #[serde(default = "default_transactional")]
    pub transactional: bool,
}

fn default_transactional() -> bool {
    true
}

impl MigrationSetConfig {
    pub fn new(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            namespace: namespace.into(),
            template: None,
            transactional: default_transactional(),
        }
    }

    /// Build the configuration from an owning module.
    pub fn from_owner(owner: &impl MigrationOwner) -> Self {
        Self::new(owner.name(), owner.path(), owner.namespace())
    }

    pub fn with_template(mut self, template: impl Into<PathBuf>) -> Self {
        self.template = Some(template.into());
        self
    }

    /// Check that the required fields are present.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(MigratorError::Config("migration set name is empty".into()));
        }
        if self.namespace.trim().is_empty() {
            return Err(MigratorError::Config("migration namespace is empty".into()));
        }
        if self.path.as_os_str().is_empty() {
            return Err(MigratorError::Config("migration path is empty".into()));
        }
        Ok(())
    }

    /// Ledger table name derived from the set name.
    pub fn table_name(&self) -> String {
        normalize_name(&self.name)
    }

    /// Directory holding the migration files.
    pub fn migrations_dir(&self) -> PathBuf {
        self.path.join(MIGRATIONS_DIR_NAME)
    }

    /// Namespace rendered into scaffolded migrations.
    pub fn migrations_namespace(&self) -> String {
        format!("{}::migrations", self.namespace)
    }
}
