//! `carbon-optimizer` binary: runs the benchmarking pipeline end to end.
//!
//! # Usage
//!
//! ```bash
//! carbon-optimizer
//! carbon-optimizer --config experiment.json --alpha 0.7 --beta 0.3 --out results/
//! RUST_LOG=debug carbon-optimizer --runs 2
//! ```

use anyhow::{bail, Context};
use carbon_optimizer::export;
use carbon_optimizer::pipeline::{Pipeline, PhaseStatus};
use carbon_optimizer::OptimizerConfig;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(
    name = "carbon-optimizer",
    version,
    about = "Benchmark algorithms, estimate their carbon footprint, pick the greenest",
    long_about = None
)]
struct Args {
    /// Path to a JSON configuration file; defaults are used when omitted.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Weight on normalized carbon (overrides the config).
    #[arg(long)]
    alpha: Option<f64>,

    /// Weight on normalized runtime (overrides the config).
    #[arg(long)]
    beta: Option<f64>,

    /// Repetitions per cell (overrides the config).
    #[arg(long)]
    runs: Option<usize>,

    /// Directory for `raw_results.json` and `cleaned_results.parquet`.
    #[arg(short, long, value_name = "DIR")]
    out: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let mut config = match args.config.as_deref() {
        Some(path) => OptimizerConfig::from_json_file(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => OptimizerConfig::default(),
    };
    if let Some(alpha) = args.alpha {
        config.alpha = alpha;
    }
    if let Some(beta) = args.beta {
        config.beta = beta;
    }
    if let Some(runs) = args.runs {
        config.experiment.num_runs = runs;
    }
    config.validate().context("invalid configuration")?;

    let pipeline = Pipeline::new(config);
    let outcome = pipeline.run();

    for phase in outcome.phases() {
        println!("[{:?}] {}: {}", phase.status, phase.phase, phase.message);
    }
    if let Some(selection) = outcome.selection() {
        println!("Optimizer selected: {}", selection.best_algorithm());
        println!("Explanation: {}", selection.explanation());
    }

    if let Some(dir) = args.out {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("creating output directory {}", dir.display()))?;
        if let Some(report) = outcome.report() {
            let raw = dir.join("raw_results.json");
            export::write_raw_json(&raw, report.store())
                .with_context(|| format!("writing {}", raw.display()))?;
            info!(path = %raw.display(), "raw results written");
        }
        let cleaned = dir.join("cleaned_results.parquet");
        export::write_parquet(&cleaned, outcome.rows())
            .with_context(|| format!("writing {}", cleaned.display()))?;
        info!(path = %cleaned.display(), "cleaned dataset written");
    }

    if outcome.status() == PhaseStatus::Error {
        bail!("pipeline finished with errors");
    }
    info!("Pipeline complete");
    Ok(())
}
