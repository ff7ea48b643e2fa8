use serde::Serialize;

use super::{Direction, Version};

/// One step of an execution plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanStep {
    pub version: Version,
    pub direction: Direction,
}

impl PlanStep {
    pub fn up(version: impl Into<Version>) -> Self {
        Self {
            version: version.into(),
            direction: Direction::Up,
        }
    }

    pub fn down(version: impl Into<Version>) -> Self {
        Self {
            version: version.into(),
            direction: Direction::Down,
        }
    }
}

/// Ordered steps that move the ledger from `from` to `to`.
///
/// `None` on either end means "no version applied".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionPlan {
    pub from: Option<Version>,
    pub to: Option<Version>,
    pub steps: Vec<PlanStep>,
}

impl ExecutionPlan {
    /// A plan that changes nothing.
    pub fn empty(at: Option<Version>) -> Self {
        Self {
            from: at.clone(),
            to: at,
            steps: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlanStep> {
        self.steps.iter()
    }

    /// Direction of the plan, or `None` when empty.
    pub fn direction(&self) -> Option<Direction> {
        self.steps.first().map(|s| s.direction)
    }
}

impl<'a> IntoIterator for &'a ExecutionPlan {
    type Item = &'a PlanStep;
    type IntoIter = std::slice::Iter<'a, PlanStep>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}
