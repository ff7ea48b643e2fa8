use thiserror::Error;

use crate::migration::{Direction, Version};

/// Core error type for migrator operations.
#[derive(Error, Debug)]
pub enum MigratorError {
    #[error("Unknown version: {0}")]
    UnknownVersion(String),

    #[error("Already at first version.")]
    AlreadyAtFirst,

    #[error("Already at latest version.")]
    AlreadyAtLatest,

    #[error("Version {0} is already recorded in the ledger")]
    DuplicateVersion(Version),

    #[error("Version {0} is not recorded in the ledger")]
    NotFound(Version),

    #[error("Migration {version} failed while migrating {direction} after {completed} completed step(s): {source}")]
    StepExecution {
        version: Version,
        direction: Direction,
        completed: usize,
        #[source]
        source: Box<MigratorError>,
    },

    #[error("Migration {0} has no down migration and cannot be reverted")]
    Irreversible(Version),

    #[error("No migrations to execute.")]
    NothingToExecute,

    #[error("Registry error: {0}")]
    Registry(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl MigratorError {
    /// Whether this error is a first/latest boundary, which callers usually
    /// treat as a clean no-op rather than a failure.
    pub fn is_boundary(&self) -> bool {
        matches!(self, Self::AlreadyAtFirst | Self::AlreadyAtLatest)
    }

    /// Number of steps committed before the plan halted, if this is a step
    /// failure.
    pub fn completed_steps(&self) -> Option<usize> {
        match self {
            Self::StepExecution { completed, .. } => Some(*completed),
            _ => None,
        }
    }
}

/// Result type alias using MigratorError.
pub type Result<T> = std::result::Result<T, MigratorError>;
