//! `locharvest harvest`: fetch, checkpoint, then aggregate.

mod runner;

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use locharvest_core::{load_app_config, AppConfig, ConfigError, PageRange, SearchTarget};
use locharvest_scraper::{LocalsClient, RateLimiter};
use locharvest_store::CheckpointStore;

use crate::aggregate::{self, OutputArgs};

use runner::run_pages;

/// Credentials directory used when `--scrape-env-dir` is not given.
const DEFAULT_ENV_DIR_NAME: &str = "creds";

#[derive(Debug, Clone, Args)]
pub(crate) struct HarvestArgs {
    /// Named search area; also the checkpoint key prefix.
    #[arg(long, env = "LOCHARVEST_ZONE", default_value = "mar_del_plata")]
    pub zone: String,
    /// Map anchor and zoom sent as `ll`.
    #[arg(
        long,
        env = "LOCHARVEST_COORDS",
        default_value = "@-38.0174516,-57.7653418,11z",
        allow_hyphen_values = true
    )]
    pub coords: String,
    #[arg(long, env = "LOCHARVEST_QUERY", default_value = "maderera")]
    pub query: String,
    #[arg(long, env = "LOCHARVEST_COUNTRY", default_value = "BR")]
    pub country: String,
    #[arg(long, env = "LOCHARVEST_DOMAIN", default_value = "com")]
    pub domain: String,
    /// First page index (inclusive).
    #[arg(long, env = "LOCHARVEST_START", default_value_t = 0)]
    pub start: u32,
    /// Page index bound (exclusive).
    #[arg(long, env = "LOCHARVEST_END", default_value_t = 10)]
    pub end: u32,
    #[command(flatten)]
    pub output: OutputArgs,
    /// Directory holding `scrape-it.env` (defaults to `~/creds`).
    #[arg(long, env = "LOCHARVEST_SCRAPE_ENV_DIR")]
    pub scrape_env_dir: Option<PathBuf>,
    /// Continue from the existing checkpoint for this zone + query.
    #[arg(long, env = "LOCHARVEST_RESUME")]
    pub resume: bool,
    /// Skip the aggregation step after fetching.
    #[arg(long)]
    pub no_aggregate: bool,
}

impl HarvestArgs {
    pub(crate) fn target(&self) -> Result<SearchTarget, ConfigError> {
        SearchTarget::new(
            self.zone.as_str(),
            self.coords.as_str(),
            self.query.as_str(),
            self.country.as_str(),
            self.domain.as_str(),
        )
    }

    pub(crate) fn env_dir(&self) -> anyhow::Result<PathBuf> {
        if let Some(dir) = &self.scrape_env_dir {
            return Ok(dir.clone());
        }
        let home = dirs::home_dir().context(
            "cannot resolve the home directory; pass --scrape-env-dir explicitly",
        )?;
        Ok(home.join(DEFAULT_ENV_DIR_NAME))
    }

    pub(crate) fn load_config(&self) -> anyhow::Result<AppConfig> {
        let dir = self.env_dir()?;
        load_app_config(&dir)
            .with_context(|| format!("failed to load configuration from {}", dir.display()))
    }
}

/// Runs a full harvest: validate, fetch pages, then aggregate unless
/// `--no-aggregate` was given.
///
/// # Errors
///
/// Any fetch or persistence failure aborts the run. Pages recorded before the
/// failure stay on disk and can be continued with `--resume`.
pub(crate) async fn run_harvest(args: &HarvestArgs, config: &AppConfig) -> anyhow::Result<()> {
    let range = PageRange::new(args.start, args.end)?;
    let target = args.target()?;
    let layout = args.output.layout();

    let client = LocalsClient::from_config(config).context("failed to build search client")?;
    let mut store = if args.resume {
        CheckpointStore::resume(layout.clone(), target, config.checkpoint_mode).await
    } else {
        CheckpointStore::open(layout.clone(), target, config.checkpoint_mode).await
    }
    .context("failed to open checkpoint store")?;

    let limiter = RateLimiter::new(config.page_delay());
    let outcome = run_pages(&client, &mut store, range, &limiter).await?;
    let last_page = outcome
        .last_page
        .map_or_else(|| "none".to_string(), |page| page.to_string());
    println!(
        "harvested {} page(s), {} record(s) into {} (last page: {last_page}; {})",
        outcome.pages_fetched,
        outcome.records,
        store.map_path().display(),
        outcome.stop_reason
    );

    if args.no_aggregate {
        return Ok(());
    }
    let output_file = args.output.resolve_output_file(&layout, &args.query);
    let summary = aggregate::aggregate_into(&layout, output_file).await?;
    aggregate::print_summary(&summary);
    Ok(())
}

#[cfg(test)]
#[path = "harvest_test.rs"]
mod tests;
