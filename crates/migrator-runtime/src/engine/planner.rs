use migrator_core::migration::{ExecutionPlan, PlanStep, Version};

use crate::resolver::VersionResolver;

/// Build the plan moving from the resolver's current version to `target`.
///
/// Going up runs every available version in `(current, target]` in
/// ascending order. Going down reverts every executed, still available
/// version in `(target, current]` in descending order; orphaned versions
/// have no down logic and are left alone.
pub fn build_plan(resolver: &VersionResolver, target: Option<&Version>) -> ExecutionPlan {
    let current = resolver.current();

    if target == current {
        return ExecutionPlan::empty(current.cloned());
    }

    let steps = if target > current {
        resolver
            .available()
            .iter()
            .filter(|v| Some(*v) > current && Some(*v) <= target)
            .map(|v| PlanStep::up(v.clone()))
            .collect()
    } else {
        resolver
            .available()
            .iter()
            .rev()
            .filter(|v| resolver.executed().contains_key(*v))
            .filter(|v| Some(*v) > target && Some(*v) <= current)
            .map(|v| PlanStep::down(v.clone()))
            .collect()
    };

    ExecutionPlan {
        from: current.cloned(),
        to: target.cloned(),
        steps,
    }
}
