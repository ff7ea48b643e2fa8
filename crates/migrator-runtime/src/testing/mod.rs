//! Test doubles for engine-level tests.

use std::sync::{Mutex, PoisonError};

use futures::future::BoxFuture;

use migrator_core::error::{MigratorError, Result};
use migrator_core::migration::{Direction, MigrationDefinition, PlanStep, StepExecutor, Version};

/// Executor that records every step it is asked to run instead of touching
/// a database. Optionally fails on one version.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    calls: Mutex<Vec<PlanStep>>,
    fail_on: Option<Version>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// An executor that fails whenever `version` runs.
    pub fn failing_on(version: impl Into<Version>) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_on: Some(version.into()),
        }
    }

    /// Steps executed successfully so far, in order.
    pub fn calls(&self) -> Vec<PlanStep> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl StepExecutor for RecordingExecutor {
    fn execute<'a>(
        &'a self,
        migration: &'a MigrationDefinition,
        direction: Direction,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            if self.fail_on.as_ref() == Some(&migration.version) {
                return Err(MigratorError::Database(format!(
                    "simulated failure in {}",
                    migration.version
                )));
            }
            if migration.sql(direction).is_none() {
                return Err(MigratorError::Irreversible(migration.version.clone()));
            }

            self.calls
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(PlanStep {
                    version: migration.version.clone(),
                    direction,
                });
            Ok(())
        })
    }
}
