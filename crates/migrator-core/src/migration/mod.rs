mod alias;
mod definition;
mod naming;
mod plan;
mod traits;
mod version;

pub use alias::Alias;
pub use definition::{Direction, MigrationDefinition};
pub use naming::{normalize_name, LEDGER_SUFFIX, OWNER_SUFFIX};
pub use plan::{ExecutionPlan, PlanStep};
pub use traits::{LedgerEntry, OrphanedVersion, StepExecutor, VersionLedger};
pub use version::Version;
