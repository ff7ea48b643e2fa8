//! Alias resolution against ledger and registry state.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use migrator_core::error::{MigratorError, Result};
use migrator_core::migration::{Alias, OrphanedVersion, Version};

/// Resolves aliases against a snapshot of executed and available versions.
#[derive(Debug, Clone)]
pub struct VersionResolver {
    available: Vec<Version>,
    executed: BTreeMap<Version, DateTime<Utc>>,
    /// Index of the current version in `available`.
    current: Option<usize>,
}

impl VersionResolver {
    /// Build a resolver. `available` need not be sorted.
    pub fn new(mut available: Vec<Version>, executed: BTreeMap<Version, DateTime<Utc>>) -> Self {
        available.sort();
        available.dedup();

        // Orphaned versions are ignored when locating the current version.
        let current = available.iter().rposition(|v| executed.contains_key(v));

        Self {
            available,
            executed,
            current,
        }
    }

    /// Highest executed version that is still available.
    pub fn current(&self) -> Option<&Version> {
        self.current.map(|i| &self.available[i])
    }

    /// Highest available version.
    pub fn latest(&self) -> Option<&Version> {
        self.available.last()
    }

    pub fn available(&self) -> &[Version] {
        &self.available
    }

    pub fn executed(&self) -> &BTreeMap<Version, DateTime<Utc>> {
        &self.executed
    }

    /// Executed versions that are no longer available, with their execution
    /// times, in version order.
    pub fn orphaned(&self) -> Vec<OrphanedVersion> {
        self.executed
            .iter()
            .filter(|(version, _)| self.available.binary_search(version).is_err())
            .map(|(version, executed_at)| OrphanedVersion {
                version: version.clone(),
                executed_at: *executed_at,
            })
            .collect()
    }

    /// Available versions that have not been executed.
    pub fn pending(&self) -> Vec<Version> {
        self.available
            .iter()
            .filter(|v| !self.executed.contains_key(*v))
            .cloned()
            .collect()
    }

    /// Resolve an alias to a target version; `None` means "no version".
    pub fn resolve(&self, alias: &Alias) -> Result<Option<Version>> {
        match alias {
            Alias::First => Ok(None),
            Alias::Latest => Ok(self.latest().cloned()),
            Alias::Current => Ok(self.current().cloned()),
            Alias::Next => self.step(1),
            Alias::Prev => self.step(-1),
            Alias::Offset(n) => self.step(*n),
            Alias::Explicit(raw) => {
                let version = Version::new(raw.as_str());
                if self.available.binary_search(&version).is_ok() {
                    Ok(Some(version))
                } else {
                    Err(MigratorError::UnknownVersion(raw.clone()))
                }
            }
        }
    }

    /// Walk `delta` steps through the available versions from the current one.
    /// Walking back never lands on "no version"; use `first` for that.
    fn step(&self, delta: i64) -> Result<Option<Version>> {
        if delta == 0 {
            return Ok(self.current().cloned());
        }

        let position = self.current.map(|i| i as i64).unwrap_or(-1);
        let target = position.saturating_add(delta);

        if target < 0 {
            return Err(MigratorError::AlreadyAtFirst);
        }
        match usize::try_from(target).ok().and_then(|i| self.available.get(i)) {
            Some(version) => Ok(Some(version.clone())),
            None if delta > 0 => Err(MigratorError::AlreadyAtLatest),
            None => Err(MigratorError::AlreadyAtFirst),
        }
    }
}
