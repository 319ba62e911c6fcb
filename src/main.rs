use anyhow::{anyhow, Result};
use clap::Parser;
use market_scatter::{
    summary::{self, BatchSummary},
    LayoutConfig, MetricPipeline,
};
use std::{path::PathBuf, sync::atomic::AtomicBool};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "market_scatter")]
#[command(about = "Build MoM/YoY scatter JSON from city and county market extracts")]
struct Args {
    /// YAML layout config; flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding one sub-directory of extracts per metric
    #[arg(long)]
    data_dir: Option<String>,

    /// Output directory; may contain {year} and {month}
    #[arg(long)]
    output_dir: Option<String>,

    /// Metric to run (repeatable); defaults to the configured list
    #[arg(short, long = "metric")]
    metrics: Vec<String>,

    /// Run every metric found under the data directory
    #[arg(long, conflicts_with = "metrics")]
    discover: bool,

    /// Run metrics concurrently
    #[arg(long)]
    parallel: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // ─── 1) init logging ─────────────────────────────────────────────
    let default_level = if args.verbose { "debug" } else { "info" };
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_target(false)
        .init();

    // ─── 2) resolve config ───────────────────────────────────────────
    let mut cfg = match &args.config {
        Some(path) => LayoutConfig::load(path)?,
        None => LayoutConfig::default(),
    };
    if let Some(d) = args.data_dir {
        cfg.data_dir = d;
    }
    if let Some(d) = args.output_dir {
        cfg.output_dir = d;
    }
    if args.parallel {
        cfg.parallel = true;
    }
    if args.discover {
        cfg.metrics = cfg.layout().discover_metrics()?;
    } else if !args.metrics.is_empty() {
        cfg.metrics = args.metrics;
    }
    if cfg.metrics.is_empty() {
        return Err(anyhow!("no metrics to run under {}", cfg.data_dir));
    }
    info!(data_dir = %cfg.data_dir, output_dir = %cfg.output_dir, metrics = ?cfg.metrics, "configuration");

    // ─── 3) run batch ────────────────────────────────────────────────
    let pipeline = MetricPipeline::new(cfg.into_pipeline_config());
    let cancel = AtomicBool::new(false);
    let outcomes = pipeline.run_batch(&cancel);

    // ─── 4) report ───────────────────────────────────────────────────
    let batch = BatchSummary::from_outcomes(&outcomes);
    batch.log();
    println!("\n{}", summary::render(&outcomes));

    if batch.succeeded == 0 {
        return Err(anyhow!("all {} metrics failed", batch.total));
    }
    Ok(())
}
