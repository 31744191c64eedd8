//! blend-optimizer: run one blend optimization from files on disk
//!
//! # Usage
//!
//! ```bash
//! blend-optimizer --materials coals.json --model model.json
//!
//! # Explain the best blend with the staged pipeline, stop after 60 s
//! blend-optimizer --materials coals.json --model model.json \
//!     --staged-dir artifacts/ --max-seconds 60 --output result.json
//! ```
//!
//! # Environment Variables
//!
//! - `BLEND_CONFIG`: Path to the optimizer TOML config (when `--config` is not given)
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use coal_blend_optimizer::prediction::StagedPipeline;
use coal_blend_optimizer::types::MaterialTableFile;
use coal_blend_optimizer::{
    DirectPipeline, MaterialTable, OptimizationOutcome, OptimizerConfig, PredictionOracle,
    RegressionArtifact, SearchEngine, StagedPrediction,
};

#[derive(Parser, Debug)]
#[command(name = "blend-optimizer")]
#[command(about = "Find the cheapest coal blend that meets blend and coke property ranges")]
#[command(version)]
struct CliArgs {
    /// Material table JSON: {"columns": [...], "materials": [...]}
    #[arg(long, value_name = "FILE")]
    materials: PathBuf,

    /// Direct regression artifact JSON
    #[arg(long, value_name = "FILE")]
    model: PathBuf,

    /// Optimizer config TOML (default: $BLEND_CONFIG, then ./blend_config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// RNG seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Override the configured generation count
    #[arg(long)]
    generations: Option<usize>,

    /// Staged artifact directory used to explain the best blend
    #[arg(long, value_name = "DIR")]
    staged_dir: Option<PathBuf>,

    /// Write the result here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Abort the run once this many seconds have passed
    #[arg(long, env = "BLEND_MAX_SECONDS")]
    max_seconds: Option<u64>,
}

#[derive(Serialize)]
struct RunOutput {
    outcome: OptimizationOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    explanation: Option<StagedPrediction>,
}

fn load_materials(path: &Path) -> Result<MaterialTable> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let file: MaterialTableFile = serde_json::from_str(&contents)
        .with_context(|| format!("Invalid material table {}", path.display()))?;
    MaterialTable::from_file(file).with_context(|| format!("Invalid material table {}", path.display()))
}

fn load_config(args: &CliArgs) -> Result<OptimizerConfig> {
    let mut config = match &args.config {
        Some(path) => OptimizerConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => OptimizerConfig::load(),
    };

    if let Some(seed) = args.seed {
        config.search.seed = Some(seed);
    }
    if let Some(generations) = args.generations {
        config.search.generations = generations;
    }
    if let Some(dir) = &args.staged_dir {
        config.prediction.staged_dir = Some(dir.clone());
    }
    config.validate().context("Invalid configuration after CLI overrides")?;
    Ok(config)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();
    let config = load_config(&args)?;
    let constraints = config.constraints().context("Invalid constraints")?;

    let table = Arc::new(load_materials(&args.materials)?);
    info!(
        materials = table.len(),
        columns = table.width(),
        "Material table loaded"
    );

    let model = RegressionArtifact::load(&args.model)
        .with_context(|| format!("Failed to load model {}", args.model.display()))?;
    let direct = DirectPipeline::new(Arc::new(model), &table, config.prediction.drop_trailing)
        .context("Model does not fit the material table")?;
    let mut oracle = PredictionOracle::new(direct);
    if let Some(dir) = &config.prediction.staged_dir {
        let staged = StagedPipeline::load(dir, config.prediction.basicity)
            .with_context(|| format!("Failed to load staged artifacts from {}", dir.display()))?;
        oracle = oracle.with_staged(staged);
    }
    let oracle = Arc::new(oracle);

    let mut engine = SearchEngine::from_config(table.clone(), oracle.clone(), &config)?;

    let started = Instant::now();
    let deadline = args.max_seconds.map(Duration::from_secs);
    let outcome = engine.run(constraints, || {
        deadline.is_some_and(|limit| started.elapsed() >= limit)
    })?;

    let explanation = match &outcome {
        OptimizationOutcome::Completed(report) => {
            info!(
                cost = report.best.cost,
                penalty = report.best.penalty,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Best blend found"
            );
            oracle.explain(&table, &report.best.weights())
        }
        OptimizationOutcome::Aborted => {
            warn!("Run aborted before completion, no blend to report");
            None
        }
    };

    let json = serde_json::to_string_pretty(&RunOutput {
        outcome,
        explanation,
    })
    .context("Failed to serialize result")?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(path = %path.display(), "Result written");
        }
        None => println!("{json}"),
    }
    Ok(())
}
