//! Offline candidate analysis
//!
//! Classifies a CSV file on disk with the same model and pipeline the
//! service uses, and prints one verdict per candidate.
//!
//! **Usage:**
//! ```bash
//! exo-analyze candidates.csv [--output annotated.csv] [--artifact-dir DIR]
//! ```

use anyhow::{bail, Context, Result};
use clap::Parser;
use exo_common::config::{CompiledDefaults, TomlConfig};
use exo_common::FeatureSchema;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use exo_predict::analysis::analyze;
use exo_predict::config::{Args as ServiceArgs, CommonArgs, ServiceConfig};
use exo_predict::ingest::CsvSource;
use exo_predict::model::orchestrator;
use exo_predict::verdict::render_csv;

/// Offline analysis of a candidate CSV file
#[derive(Parser, Debug)]
#[command(name = "exo-analyze")]
#[command(about = "Classify exoplanet candidates in a CSV file")]
#[command(version)]
struct Args {
    /// CSV file with a kepoi_name column and KOI feature columns
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Write the annotated CSV here
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    #[command(flatten)]
    common: CommonArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let toml = TomlConfig::load(args.common.config.as_deref()).context("Failed to load config")?;
    let service_args = ServiceArgs {
        common: args.common.clone(),
        ..ServiceArgs::default()
    };
    let config = ServiceConfig::resolve(
        &service_args,
        &toml,
        &CompiledDefaults::for_current_platform(),
    )
    .context("Invalid configuration")?;

    // Quiet by default so the table is the only stdout output
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let schema = FeatureSchema::kepler();
    let state = orchestrator::initialize(&config.model_settings(), schema).await;
    let artifact = match state.ready() {
        Some(artifact) => artifact.clone(),
        None => bail!(
            "Model unavailable: {}",
            state.unavailable_reason().unwrap_or("unknown")
        ),
    };

    let input = args.input.clone();
    let analysis = tokio::task::spawn_blocking(move || {
        analyze(CsvSource::FilePath(input), &artifact, &schema)
    })
    .await
    .context("Analysis task failed")?
    .with_context(|| format!("Failed to analyze {}", args.input.display()))?;

    println!("{:>4}  {:<16} {:>10}  {}", "#", "kepoi_name", "confidence", "verdict");
    for (i, record) in analysis.records.iter().enumerate() {
        let percent = record
            .percent()
            .map(|p| format!("{:.2}%", p))
            .unwrap_or_else(|| "n/a".to_string());
        println!(
            "{:>4}  {:<16} {:>10}  {}",
            i + 1,
            record.identifier,
            percent,
            record.verdict.label()
        );
    }

    if !analysis.reconcile.synthesized.is_empty() {
        eprintln!(
            "Note: columns filled with 0: {}",
            analysis.reconcile.synthesized.join(", ")
        );
    }
    if analysis.load.skipped_rows > 0 {
        eprintln!("Note: {} malformed rows skipped", analysis.load.skipped_rows);
    }

    if let Some(output) = &args.output {
        let csv = render_csv(&analysis.records).context("Failed to render CSV")?;
        std::fs::write(output, csv)
            .with_context(|| format!("Failed to write {}", output.display()))?;
        eprintln!("Annotated CSV written to {}", output.display());
    }

    Ok(())
}
