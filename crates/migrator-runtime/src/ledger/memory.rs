use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use tokio::sync::RwLock;

use migrator_core::error::{MigratorError, Result};
use migrator_core::migration::{Version, VersionLedger};

/// Ledger kept in process memory.
///
/// Nothing survives the process; useful for tests and for planning against a
/// known state.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    entries: RwLock<BTreeMap<Version, DateTime<Utc>>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a ledger that already records the given versions.
    pub fn with_entries(entries: impl IntoIterator<Item = (Version, DateTime<Utc>)>) -> Self {
        Self {
            entries: RwLock::new(entries.into_iter().collect()),
        }
    }

    /// Create a ledger recording the given versions as executed now.
    pub fn with_versions<V: Into<Version>>(versions: impl IntoIterator<Item = V>) -> Self {
        let now = Utc::now();
        Self::with_entries(versions.into_iter().map(|v| (v.into(), now)))
    }
}

impl VersionLedger for InMemoryLedger {
    fn record_applied<'a>(&'a self, version: &'a Version) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let mut entries = self.entries.write().await;
            if entries.contains_key(version) {
                return Err(MigratorError::DuplicateVersion(version.clone()));
            }
            entries.insert(version.clone(), Utc::now());
            Ok(())
        })
    }

    fn record_reverted<'a>(&'a self, version: &'a Version) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.entries
                .write()
                .await
                .remove(version)
                .map(|_| ())
                .ok_or_else(|| MigratorError::NotFound(version.clone()))
        })
    }

    fn list_executed(&self) -> BoxFuture<'_, Result<BTreeMap<Version, DateTime<Utc>>>> {
        Box::pin(async move { Ok(self.entries.read().await.clone()) })
    }

    fn timestamp_of<'a>(&'a self, version: &'a Version) -> BoxFuture<'a, Result<DateTime<Utc>>> {
        Box::pin(async move {
            self.entries
                .read()
                .await
                .get(version)
                .copied()
                .ok_or_else(|| MigratorError::NotFound(version.clone()))
        })
    }
}
