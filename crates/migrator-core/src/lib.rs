pub mod config;
pub mod error;
pub mod migration;

pub use config::{DatabaseConfig, MigrationOwner, MigrationSetConfig, MigratorConfig};
pub use error::{MigratorError, Result};
pub use migration::{
    normalize_name, Alias, Direction, ExecutionPlan, LedgerEntry, MigrationDefinition,
    OrphanedVersion, PlanStep, StepExecutor, Version, VersionLedger,
};
