//! `locharvest aggregate`: merge persisted checkpoints without fetching.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use locharvest_store::{AggregateSummary, Aggregator, ArtifactLayout};

/// Where run artifacts live and where the final dataset goes.
#[derive(Debug, Clone, Args)]
pub(crate) struct OutputArgs {
    /// Root directory holding `jsons/`, `dicts/` and `dfs/` (defaults to the
    /// working directory).
    #[arg(long, env = "LOCHARVEST_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,
    /// Final dataset path (defaults to `{output_dir}/{query}_final.csv`).
    #[arg(long, env = "LOCHARVEST_OUTPUT_FILE")]
    pub output_file: Option<PathBuf>,
}

impl OutputArgs {
    pub(crate) fn layout(&self) -> ArtifactLayout {
        ArtifactLayout::new(self.output_dir.clone().unwrap_or_else(|| PathBuf::from(".")))
    }

    pub(crate) fn resolve_output_file(&self, layout: &ArtifactLayout, query: &str) -> PathBuf {
        self.output_file
            .clone()
            .unwrap_or_else(|| layout.default_output_file(query))
    }
}

#[derive(Debug, Clone, Args)]
pub(crate) struct AggregateArgs {
    #[command(flatten)]
    pub output: OutputArgs,
    /// Keyword used to name the default output file.
    #[arg(long, env = "LOCHARVEST_QUERY", default_value = "maderera")]
    pub query: String,
}

pub(crate) async fn run_aggregate(args: &AggregateArgs) -> anyhow::Result<()> {
    let layout = args.output.layout();
    let output_file = args.output.resolve_output_file(&layout, &args.query);
    let summary = aggregate_into(&layout, output_file).await?;
    print_summary(&summary);
    Ok(())
}

/// Runs the aggregator over `layout`'s maps directory.
pub(crate) async fn aggregate_into(
    layout: &ArtifactLayout,
    output_file: PathBuf,
) -> anyhow::Result<AggregateSummary> {
    Aggregator::new(layout)
        .run(&output_file)
        .await
        .with_context(|| format!("failed to aggregate into {}", output_file.display()))
}

pub(crate) fn print_summary(summary: &AggregateSummary) {
    println!(
        "aggregated {} checkpoint(s), {} page(s): {} record(s) in, {} unique out -> {}",
        summary.artifacts,
        summary.pages,
        summary.records_in,
        summary.records_out,
        summary.output_file.display()
    );
}
