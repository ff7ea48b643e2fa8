mod generate;
mod migrate;
mod status;
mod write_sql;

pub use generate::GenerateCommand;
pub use migrate::MigrateCommand;
pub use status::StatusCommand;
pub use write_sql::WriteSqlCommand;

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use console::style;
use tracing::{debug, info};

use migrator_core::config::{MigrationSetConfig, MigratorConfig};
use migrator_runtime::{Database, MigrationManager, PgExecutor, PgLedger};

/// Database migration manager.
#[derive(Parser)]
#[command(name = "migrator")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Configuration file path.
    #[arg(short, long, default_value = "migrator.toml", global = true)]
    pub config: String,

    /// Migration set name (overrides config).
    #[arg(long, global = true)]
    pub name: Option<String>,

    /// Root path of the migration set (overrides config).
    #[arg(long, global = true)]
    pub path: Option<PathBuf>,

    /// Namespace of the migration set (overrides config).
    #[arg(long, global = true)]
    pub namespace: Option<String>,

    /// Database URL (overrides config and DATABASE_URL).
    #[arg(long, global = true)]
    pub database_url: Option<String>,

    /// Verbose logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Migrate the database to a version or alias.
    Migrate(MigrateCommand),

    /// Show migration status.
    Status(StatusCommand),

    /// Write the SQL a migration would run to a file.
    WriteSql(WriteSqlCommand),

    /// Generate a blank migration file.
    Generate(GenerateCommand),
}

impl Cli {
    /// Install the log subscriber. Logs go to stderr so command output
    /// stays machine-readable.
    pub fn init_tracing(&self) {
        let log_level = if self.global.verbose { "debug" } else { "info" };
        tracing_subscriber::fmt()
            .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.to_string()))
            .with_writer(std::io::stderr)
            .init();
    }

    /// Execute the CLI command.
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Migrate(cmd) => cmd.execute(&self.global).await,
            Commands::Status(cmd) => cmd.execute(&self.global).await,
            Commands::WriteSql(cmd) => cmd.execute(&self.global).await,
            Commands::Generate(cmd) => cmd.execute(&self.global).await,
        }
    }
}

impl GlobalArgs {
    /// Load the configuration file and apply command-line overrides.
    ///
    /// Without a configuration file the migration set is built from
    /// `--name` and `--namespace`, rooted at `--path` or the current
    /// directory.
    pub fn load_config(&self) -> Result<MigratorConfig> {
        let config_path = Path::new(&self.config);
        let mut config = if config_path.exists() {
            info!("Loading configuration from {}", self.config);
            MigratorConfig::from_file(config_path)?
        } else {
            let (Some(name), Some(namespace)) = (&self.name, &self.namespace) else {
                anyhow::bail!(
                    "Configuration file not found: {}\nPass --name and --namespace to run without one.",
                    self.config
                );
            };
            let root = match &self.path {
                Some(path) => path.clone(),
                None => std::env::current_dir()?,
            };
            debug!(
                "No configuration file at {}; using migration set {} rooted at {:?}",
                self.config, name, root
            );
            MigratorConfig::new("", MigrationSetConfig::new(name, root, namespace))
        };

        if let Some(name) = &self.name {
            config.migrations.name = name.clone();
        }
        if let Some(path) = &self.path {
            config.migrations.path = path.clone();
        }
        if let Some(namespace) = &self.namespace {
            config.migrations.namespace = namespace.clone();
        }

        if let Some(url) = &self.database_url {
            config.database.url = url.clone();
        } else if config.database.url.is_empty() {
            if let Ok(url) = std::env::var("DATABASE_URL") {
                config.database.url = url;
            }
        }

        if config.database.url.is_empty() {
            debug!("No database URL configured");
        }

        config.migrations.validate()?;
        Ok(config)
    }

    /// Load configuration and connect the migration set to its database.
    pub(crate) async fn connect(
        &self,
    ) -> Result<(Database, MigrationManager<PgLedger, PgExecutor>)> {
        let config = self.load_config()?;
        let db = Database::from_config(&config.database).await?;
        let manager = MigrationManager::connect(&db, config.migrations).await?;
        Ok((db, manager))
    }
}

fn print_header(title: &str) {
    println!();
    println!("  {}", style(title).bold().cyan());
    println!();
}
