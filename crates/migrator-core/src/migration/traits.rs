use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serde::Serialize;

use super::{Direction, MigrationDefinition, Version};
use crate::error::Result;

/// A version recorded as executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerEntry {
    pub version: Version,
    pub executed_at: DateTime<Utc>,
}

/// An executed version that no longer exists in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrphanedVersion {
    pub version: Version,
    pub executed_at: DateTime<Utc>,
}

/// Durable record of executed migration versions.
///
/// Mutations must be durable before the returned future resolves; the engine
/// relies on that between steps.
pub trait VersionLedger: Send + Sync {
    /// Record a version as applied. Fails with `DuplicateVersion` if it is
    /// already recorded.
    fn record_applied<'a>(&'a self, version: &'a Version) -> BoxFuture<'a, Result<()>>;

    /// Remove a version. Fails with `NotFound` if it is not recorded.
    fn record_reverted<'a>(&'a self, version: &'a Version) -> BoxFuture<'a, Result<()>>;

    /// Snapshot of every executed version and when it was executed.
    fn list_executed(&self) -> BoxFuture<'_, Result<BTreeMap<Version, DateTime<Utc>>>>;

    /// When a version was executed. Fails with `NotFound` if it never was.
    fn timestamp_of<'a>(&'a self, version: &'a Version) -> BoxFuture<'a, Result<DateTime<Utc>>>;

    /// Statement a rendered script should contain to keep this ledger in step
    /// with a manual run of `direction` for `version`.
    fn script_statement(&self, _version: &Version, _direction: Direction) -> Option<String> {
        None
    }
}

/// Runs one migration's logic against the target database.
pub trait StepExecutor: Send + Sync {
    /// Execute `migration` in `direction`. The caller guarantees the
    /// direction has SQL to run.
    fn execute<'a>(
        &'a self,
        migration: &'a MigrationDefinition,
        direction: Direction,
    ) -> BoxFuture<'a, Result<()>>;
}
