//! Runtime for the migrator: the migration registry, version ledgers,
//! resolution and execution engine, scaffolding, and the facade tying them
//! to one configured migration set.

pub mod db;
pub mod engine;
pub mod ledger;
pub mod manager;
pub mod registry;
pub mod resolver;
pub mod scaffold;
pub mod testing;

pub use db::Database;
pub use engine::{MigrationEngine, MigrationOutcome, MigrationStatus, PgExecutor, Resolution};
pub use ledger::{InMemoryLedger, PgLedger};
pub use manager::MigrationManager;
pub use registry::MigrationRegistry;
pub use resolver::VersionResolver;
pub use scaffold::{
    load_template, scaffold_migration, GeneratedMigration, Placeholders, ScaffoldGenerator,
};
