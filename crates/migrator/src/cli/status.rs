use anyhow::Result;
use clap::Parser;
use console::style;

use migrator_core::config::MigrationSetConfig;
use migrator_runtime::MigrationStatus;

use super::migrate::version_label;
use super::{print_header, GlobalArgs};

/// Show migration status.
#[derive(Parser, Debug)]
pub struct StatusCommand {
    /// Print the status as JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusCommand {
    pub async fn execute(self, global: &GlobalArgs) -> Result<()> {
        let (db, manager) = global.connect().await?;
        let status = manager.status().await;
        db.close().await;
        let status = status?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&status)?);
        } else {
            print_header("Migration Status");
            print_status(manager.config(), &status);
        }
        Ok(())
    }
}

fn print_status(config: &MigrationSetConfig, status: &MigrationStatus) {
    let rows = [
        ("Name", config.name.clone()),
        ("Table", config.table_name()),
        ("Directory", config.migrations_dir().display().to_string()),
        ("Namespace", config.migrations_namespace()),
        ("Current Version", version_label(status.current.as_ref())),
        ("Latest Version", version_label(status.latest.as_ref())),
        ("Executed Migrations", status.executed.len().to_string()),
        ("Orphaned Migrations", status.orphaned.len().to_string()),
        ("Available Migrations", status.available.to_string()),
        ("New Migrations", status.new.len().to_string()),
    ];

    for (label, value) in rows {
        println!("  {:<22} {}", style(label).dim(), style(value).cyan());
    }

    if !status.pending.is_empty() {
        println!();
        println!("  {} Pending:", style("○").yellow());
        for version in &status.pending {
            println!("    {} {}", style("→").dim(), style(version).yellow());
        }
    }

    if !status.orphaned.is_empty() {
        println!();
        println!("  {} Not registered:", style("⚠").yellow());
        for entry in &status.orphaned {
            println!(
                "    {} {} ({})",
                style(">>").yellow(),
                entry.executed_at.format("%Y-%m-%d %H:%M:%S"),
                entry.version
            );
        }
    }
    println!();
}
