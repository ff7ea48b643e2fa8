use std::fmt::Write;

use chrono::{DateTime, Utc};

use migrator_core::error::{MigratorError, Result};
use migrator_core::migration::{ExecutionPlan, Version, VersionLedger};

use crate::registry::MigrationRegistry;

/// Render a plan as a SQL script for offline review or manual application.
///
/// Each step contributes its SQL followed by the ledger's bookkeeping
/// statement, if the ledger provides one.
pub fn render_script(
    plan: &ExecutionPlan,
    registry: &MigrationRegistry,
    ledger: &dyn VersionLedger,
    generated_at: DateTime<Utc>,
) -> Result<String> {
    let mut script = String::new();
    let describe = |v: &Option<Version>| {
        v.as_ref().map(|v| v.to_string()).unwrap_or_else(|| "none".to_string())
    };

    writeln!(script, "-- Migrating from {} to {}", describe(&plan.from), describe(&plan.to))
        .map_err(fmt_error)?;
    writeln!(
        script,
        "-- Generated at: {}",
        generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    )
    .map_err(fmt_error)?;

    for step in plan {
        let migration = registry.get(&step.version)?;
        let sql = migration
            .sql(step.direction)
            .ok_or_else(|| MigratorError::Irreversible(step.version.clone()))?;

        writeln!(script).map_err(fmt_error)?;
        let heading = match &migration.description {
            Some(description) => writeln!(
                script,
                "-- Version {} ({}): {}",
                step.version, step.direction, description
            ),
            None => writeln!(script, "-- Version {} ({})", step.version, step.direction),
        };
        heading.map_err(fmt_error)?;

        writeln!(script, "{}", sql.trim()).map_err(fmt_error)?;
        if let Some(statement) = ledger.script_statement(&step.version, step.direction) {
            writeln!(script, "{}", statement).map_err(fmt_error)?;
        }
    }

    Ok(script)
}

fn fmt_error(e: std::fmt::Error) -> MigratorError {
    MigratorError::InvalidState(format!("Failed to render script: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::InMemoryLedger;
    use chrono::TimeZone;
    use migrator_core::migration::{MigrationDefinition, PlanStep};

    fn registry() -> MigrationRegistry {
        MigrationRegistry::from_definitions([
            MigrationDefinition::new("1", "CREATE TABLE a (id INT);")
                .with_down("DROP TABLE a;")
                .with_description("create a"),
            MigrationDefinition::new("2", "CREATE TABLE b (id INT);"),
        ])
        .unwrap()
    }

    #[test]
    fn test_render_up_script() {
        let plan = ExecutionPlan {
            from: None,
            to: Some(Version::new("2")),
            steps: vec![PlanStep::up("1"), PlanStep::up("2")],
        };
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();

        let script = render_script(&plan, &registry(), &InMemoryLedger::new(), at).unwrap();

        assert_eq!(
            script,
            "-- Migrating from none to 2\n\
             -- Generated at: 2024-01-02 03:04:05 UTC\n\
             \n\
             -- Version 1 (up): create a\n\
             CREATE TABLE a (id INT);\n\
             \n\
             -- Version 2 (up)\n\
             CREATE TABLE b (id INT);\n"
        );
    }

    #[test]
    fn test_render_irreversible_down_fails() {
        let plan = ExecutionPlan {
            from: Some(Version::new("2")),
            to: None,
            steps: vec![PlanStep::down("2"), PlanStep::down("1")],
        };

        let err = render_script(&plan, &registry(), &InMemoryLedger::new(), Utc::now()).unwrap_err();
        assert!(matches!(err, MigratorError::Irreversible(v) if v.as_str() == "2"));
    }

    #[test]
    fn test_render_empty_plan() {
        let plan = ExecutionPlan::empty(None);
        let script = render_script(&plan, &registry(), &InMemoryLedger::new(), Utc::now()).unwrap();
        assert!(script.starts_with("-- Migrating from none to none\n"));
        assert_eq!(script.lines().count(), 2);
    }
}
