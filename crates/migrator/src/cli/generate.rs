use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use console::style;

use migrator_core::config::MigrationSetConfig;
use migrator_runtime::{scaffold_migration, GeneratedMigration};

use super::{print_header, GlobalArgs};

/// Generate a blank migration file.
#[derive(Parser, Debug)]
pub struct GenerateCommand {
    /// SQL for the up section.
    #[arg(long)]
    pub up: Option<String>,

    /// SQL for the down section.
    #[arg(long)]
    pub down: Option<String>,

    /// Template file (overrides config).
    #[arg(long)]
    pub template: Option<PathBuf>,
}

impl GenerateCommand {
    pub async fn execute(self, global: &GlobalArgs) -> Result<()> {
        let config = global.load_config()?;
        let generated = self.generate(&config.migrations)?;

        print_header("Generate");
        println!(
            "  {} Generated new migration {} at {}",
            style("✓").green(),
            style(&generated.version).cyan(),
            style(generated.path.display()).cyan()
        );
        println!();
        Ok(())
    }

    /// Scaffold the file. No database connection is needed.
    pub(crate) fn generate(&self, config: &MigrationSetConfig) -> Result<GeneratedMigration> {
        let generated = scaffold_migration(
            config,
            self.template.as_deref(),
            self.up.as_deref(),
            self.down.as_deref(),
        )?;
        Ok(generated)
    }
}
