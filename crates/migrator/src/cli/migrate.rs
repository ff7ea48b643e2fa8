use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use console::style;
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};

use migrator_core::migration::{Alias, Direction, StepExecutor, Version, VersionLedger};
use migrator_runtime::MigrationManager;

use super::{print_header, GlobalArgs};

/// Migrate the database to a version or alias.
#[derive(Parser, Debug)]
pub struct MigrateCommand {
    /// Target version, or one of first, latest, prev, next, current, current+N, current-N.
    #[arg(default_value = "latest")]
    pub version: String,

    /// Show the steps without executing or recording anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the confirmation prompt.
    #[arg(short = 'y', long)]
    pub yes: bool,
}

impl MigrateCommand {
    pub async fn execute(self, global: &GlobalArgs) -> Result<()> {
        let (db, manager) = global.connect().await?;

        print_header("Migrations");
        let result = self.run(&manager).await;

        db.close().await;
        result
    }

    /// Resolve, preview, confirm and apply.
    pub(crate) async fn run<L, E>(&self, manager: &MigrationManager<L, E>) -> Result<()>
    where
        L: VersionLedger,
        E: StepExecutor,
    {
        let engine = manager.engine();

        let resolution = match engine.resolve(&Alias::parse(&self.version)).await {
            Ok(resolution) => resolution,
            Err(e) if e.is_boundary() => {
                println!("  {} {}", style("ℹ").blue(), e);
                println!();
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let plan = engine.plan(resolution.target.as_ref()).await?;
        if plan.is_empty() {
            println!(
                "  {} Already at {}; nothing to migrate",
                style("ℹ").blue(),
                version_label(resolution.current.as_ref())
            );
            println!();
            return Ok(());
        }

        println!(
            "  {} Migrating from {} to {}",
            style("→").dim(),
            style(version_label(plan.from.as_ref())).cyan(),
            style(version_label(plan.to.as_ref())).cyan()
        );
        for step in &plan {
            let arrow = match step.direction {
                Direction::Up => style("↑").green(),
                Direction::Down => style("↓").yellow(),
            };
            println!("    {} {}", arrow, step.version);
        }
        println!();

        if !self.dry_run && !self.yes {
            let confirmed = Confirm::new()
                .with_prompt("  Schema changes may cause data loss. Continue?")
                .default(false)
                .interact()?;
            if !confirmed {
                println!("  {} Migration cancelled", style("ℹ").blue());
                println!();
                return Ok(());
            }
        }

        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message(format!("Applying {} step(s)...", plan.len()));

        let applied = engine.apply(&plan, self.dry_run).await;
        pb.finish_and_clear();

        match applied {
            Ok(count) if self.dry_run => {
                println!(
                    "  {} Dry run: {} step(s) validated, nothing executed",
                    style("✓").green(),
                    count
                );
            }
            Ok(count) => {
                println!("  {} Applied {} step(s)", style("✓").green(), count);
            }
            Err(e) => {
                if let Some(completed) = e.completed_steps() {
                    println!(
                        "  {} {} step(s) committed before the failure",
                        style("✗").red(),
                        completed
                    );
                }
                return Err(e.into());
            }
        }
        println!();
        Ok(())
    }
}

pub(crate) fn version_label(version: Option<&Version>) -> String {
    version
        .map(|v| v.to_string())
        .unwrap_or_else(|| "0".to_string())
}
