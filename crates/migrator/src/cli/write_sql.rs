use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use console::style;

use migrator_core::error::MigratorError;

use super::{print_header, GlobalArgs};

/// Write the SQL a migration would run to a file.
#[derive(Parser, Debug)]
pub struct WriteSqlCommand {
    /// Target version or alias.
    #[arg(default_value = "latest")]
    pub version: String,

    /// Output file or directory (defaults to the current directory).
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl WriteSqlCommand {
    pub async fn execute(self, global: &GlobalArgs) -> Result<()> {
        let destination = match self.output {
            Some(path) => path,
            None => std::env::current_dir()?,
        };

        let (db, manager) = global.connect().await?;
        let written = manager.write_sql(&self.version, &destination).await;
        db.close().await;

        print_header("Write SQL");
        match written {
            Ok(path) => {
                println!(
                    "  {} Wrote migration SQL to {}",
                    style("✓").green(),
                    style(path.display()).cyan()
                );
            }
            Err(e) if e.is_boundary() || matches!(e, MigratorError::NothingToExecute) => {
                println!("  {} {}", style("ℹ").blue(), e);
            }
            Err(e) => return Err(e.into()),
        }
        println!();
        Ok(())
    }
}
