//! Diffing, planning and execution of migrations.
//!
//! Plans run one step at a time. Each step's SQL runs first and the ledger is
//! updated right after it, so a failure halts the plan with every earlier
//! step still committed. There is no rollback across steps: migrations may
//! contain DDL that cannot be undone transactionally.

mod executor;
mod planner;
mod script;

pub use executor::PgExecutor;
pub use planner::build_plan;
pub use script::render_script;

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use migrator_core::error::{MigratorError, Result};
use migrator_core::migration::{
    Alias, Direction, ExecutionPlan, LedgerEntry, OrphanedVersion, StepExecutor, Version,
    VersionLedger,
};

use crate::registry::MigrationRegistry;
use crate::resolver::VersionResolver;

/// Result of a target resolution.
#[derive(Debug, Clone, Serialize)]
pub struct Resolution {
    pub current: Option<Version>,
    pub target: Option<Version>,
    /// Executed versions missing from the registry. Advisory only.
    pub orphaned: Vec<OrphanedVersion>,
}

/// Result of a `migrate` call.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationOutcome {
    pub plan: ExecutionPlan,
    /// Steps executed, or validated and counted on a dry run.
    pub applied: usize,
    pub dry_run: bool,
    pub orphaned: Vec<OrphanedVersion>,
}

/// Snapshot of the ledger against the registry.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationStatus {
    pub current: Option<Version>,
    pub latest: Option<Version>,
    pub executed: Vec<LedgerEntry>,
    pub available: usize,
    /// Available versions not yet executed.
    pub pending: Vec<Version>,
    /// Pending versions that a `latest` migration will run.
    pub new: Vec<Version>,
    pub orphaned: Vec<OrphanedVersion>,
}

/// Orchestrates resolution, planning and execution for one migration set.
pub struct MigrationEngine<L, E> {
    registry: MigrationRegistry,
    ledger: L,
    executor: E,
}

impl<L, E> MigrationEngine<L, E>
where
    L: VersionLedger,
    E: StepExecutor,
{
    pub fn new(registry: MigrationRegistry, ledger: L, executor: E) -> Self {
        Self {
            registry,
            ledger,
            executor,
        }
    }

    pub fn registry(&self) -> &MigrationRegistry {
        &self.registry
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Swap in a freshly loaded registry, returning the old one.
    pub fn replace_registry(&mut self, registry: MigrationRegistry) -> MigrationRegistry {
        std::mem::replace(&mut self.registry, registry)
    }

    /// Snapshot the ledger into a resolver.
    pub async fn resolver(&self) -> Result<VersionResolver> {
        let executed = self.ledger.list_executed().await?;
        Ok(VersionResolver::new(self.registry.list_available(), executed))
    }

    /// Resolve an alias to a target. Orphaned versions are logged as a
    /// warning and returned, whether or not resolution succeeds.
    pub async fn resolve(&self, alias: &Alias) -> Result<Resolution> {
        let resolver = self.resolver().await?;
        let orphaned = resolver.orphaned();
        warn_orphaned(&orphaned);

        let target = resolver.resolve(alias)?;
        debug!(
            "Resolved '{}' to {} (current {})",
            alias,
            version_or_none(target.as_ref()),
            version_or_none(resolver.current())
        );

        Ok(Resolution {
            current: resolver.current().cloned(),
            target,
            orphaned,
        })
    }

    /// Plan the steps from the current version to `target`.
    pub async fn plan(&self, target: Option<&Version>) -> Result<ExecutionPlan> {
        if let Some(version) = target {
            if !self.registry.contains(version) {
                return Err(MigratorError::UnknownVersion(version.to_string()));
            }
        }
        let resolver = self.resolver().await?;
        Ok(build_plan(&resolver, target))
    }

    /// Check that every step can run: the version is known and, going
    /// down, has down logic.
    pub fn validate(&self, plan: &ExecutionPlan) -> Result<()> {
        for step in plan {
            let migration = self.registry.get(&step.version)?;
            if step.direction == Direction::Down && !migration.is_reversible() {
                return Err(MigratorError::Irreversible(step.version.clone()));
            }
        }
        Ok(())
    }

    /// Run a plan step by step and return the number of steps applied.
    ///
    /// The plan is validated before anything runs. On a dry run nothing is
    /// executed or recorded, but every step is still validated and counted.
    pub async fn apply(&self, plan: &ExecutionPlan, dry_run: bool) -> Result<usize> {
        self.validate(plan)?;

        if dry_run {
            for step in plan {
                info!("[dry-run] Would migrate {} {}", step.direction, step.version);
            }
            return Ok(plan.len());
        }

        let mut completed = 0;
        for step in plan {
            let migration = self.registry.get(&step.version)?;
            info!("Migrating {} to {}", step.direction, step.version);
            let start = Instant::now();

            let wrap = |source: MigratorError| MigratorError::StepExecution {
                version: step.version.clone(),
                direction: step.direction,
                completed,
                source: Box::new(source),
            };

            self.executor
                .execute(migration, step.direction)
                .await
                .map_err(wrap)?;

            let recorded = match step.direction {
                Direction::Up => self.ledger.record_applied(&step.version).await,
                Direction::Down => self.ledger.record_reverted(&step.version).await,
            };
            recorded.map_err(wrap)?;

            completed += 1;
            info!(
                "Migrated {} {} in {}ms",
                step.direction,
                step.version,
                start.elapsed().as_millis()
            );
        }

        Ok(completed)
    }

    /// Render a plan as SQL without executing or recording anything.
    pub fn render_as_script(&self, plan: &ExecutionPlan) -> Result<String> {
        self.validate(plan)?;
        render_script(plan, &self.registry, &self.ledger, Utc::now())
    }

    /// Resolve `alias`, plan, and apply.
    pub async fn migrate(&self, alias: &Alias, dry_run: bool) -> Result<MigrationOutcome> {
        let resolution = self.resolve(alias).await?;
        let plan = self.plan(resolution.target.as_ref()).await?;

        if plan.is_empty() {
            info!("Already at {}; nothing to migrate", version_or_none(plan.to.as_ref()));
        }

        let applied = self.apply(&plan, dry_run).await?;
        Ok(MigrationOutcome {
            plan,
            applied,
            dry_run,
            orphaned: resolution.orphaned,
        })
    }

    /// Resolve `alias`, plan, and write the plan as a SQL script.
    ///
    /// When `destination` is a directory the script is written to a
    /// timestamped file inside it. Fails if there is nothing to migrate.
    pub async fn write_sql(&self, alias: &Alias, destination: &Path) -> Result<PathBuf> {
        let resolution = self.resolve(alias).await?;
        let plan = self.plan(resolution.target.as_ref()).await?;
        if plan.is_empty() {
            return Err(MigratorError::NothingToExecute);
        }

        let script = self.render_as_script(&plan)?;
        let path = if destination.is_dir() {
            destination.join(format!(
                "migration_{}.sql",
                Utc::now().format("%Y%m%d%H%M%S")
            ))
        } else {
            destination.to_path_buf()
        };

        std::fs::write(&path, script)?;
        info!("Wrote {} step(s) to {:?}", plan.len(), path);
        Ok(path)
    }

    /// Compare the ledger with the registry.
    pub async fn status(&self) -> Result<MigrationStatus> {
        let resolver = self.resolver().await?;
        let current = resolver.current().cloned();
        let pending = resolver.pending();
        let new = pending
            .iter()
            .filter(|v| Some(*v) > current.as_ref())
            .cloned()
            .collect();

        Ok(MigrationStatus {
            current,
            latest: resolver.latest().cloned(),
            executed: resolver
                .executed()
                .iter()
                .map(|(version, executed_at)| LedgerEntry {
                    version: version.clone(),
                    executed_at: *executed_at,
                })
                .collect(),
            available: resolver.available().len(),
            pending,
            new,
            orphaned: resolver.orphaned(),
        })
    }
}

fn warn_orphaned(orphaned: &[OrphanedVersion]) {
    if orphaned.is_empty() {
        return;
    }
    warn!(
        "You have {} previously executed migration(s) in the database that are not registered migrations",
        orphaned.len()
    );
    for entry in orphaned {
        warn!(
            "  >> {} ({})",
            entry.executed_at.format("%Y-%m-%d %H:%M:%S"),
            entry.version
        );
    }
}

fn version_or_none(version: Option<&Version>) -> String {
    version.map(|v| v.to_string()).unwrap_or_else(|| "none".to_string())
}
