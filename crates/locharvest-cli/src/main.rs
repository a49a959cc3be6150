mod aggregate;
mod harvest;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::aggregate::AggregateArgs;
use crate::harvest::HarvestArgs;

/// Fallback filter for commands that run without loading the credential file.
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Parser)]
#[command(name = "locharvest")]
#[command(about = "Harvest paginated local-business search results into one deduplicated dataset")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch pages for one zone + keyword, checkpoint each, then aggregate.
    Harvest(HarvestArgs),
    /// Merge every checkpoint under the output directory into the final dataset.
    Aggregate(AggregateArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    match cli.command {
        Commands::Harvest(args) => {
            let config = args.load_config()?;
            init_tracing(&config.log_level)?;
            harvest::run_harvest(&args, &config).await
        }
        Commands::Aggregate(args) => {
            let level = std::env::var("LOCHARVEST_LOG_LEVEL")
                .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string());
            init_tracing(&level)?;
            aggregate::run_aggregate(&args).await
        }
    }
}

/// Installs the fmt subscriber. `RUST_LOG` wins over the configured level.
fn init_tracing(level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;
    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}
