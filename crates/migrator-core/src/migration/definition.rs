use std::fmt;

use serde::{Deserialize, Serialize};

use super::Version;

/// Direction in which a migration is run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Apply the migration.
    Up,
    /// Revert the migration.
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Up => f.write_str("up"),
            Self::Down => f.write_str("down"),
        }
    }
}

/// A single available migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationDefinition {
    pub version: Version,
    /// Human-readable description, if any.
    pub description: Option<String>,
    /// SQL run when migrating up.
    pub up: String,
    /// SQL run when migrating down. `None` marks the migration irreversible.
    pub down: Option<String>,
}

impl MigrationDefinition {
    pub fn new(version: impl Into<Version>, up: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            description: None,
            up: up.into(),
            down: None,
        }
    }

    pub fn with_down(mut self, down: impl Into<String>) -> Self {
        let down = down.into();
        self.down = if down.trim().is_empty() { None } else { Some(down) };
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn is_reversible(&self) -> bool {
        self.down.is_some()
    }

    /// SQL for the given direction.
    pub fn sql(&self, direction: Direction) -> Option<&str> {
        match direction {
            Direction::Up => Some(self.up.as_str()),
            Direction::Down => self.down.as_deref(),
        }
    }
}
