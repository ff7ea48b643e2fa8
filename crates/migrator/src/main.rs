use anyhow::Result;
use clap::Parser;

use migrator::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    cli.init_tracing();
    cli.execute().await
}
