//! Claim Anomaly Engine - Command line entry point
//!
//! `run` trains a model and scores a feature bundle; `score` reuses a saved
//! model and skips search and training.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use claim_anomaly_core::constants::{APP_NAME, APP_VERSION};
use claim_anomaly_core::logic::features::load_bundle;
use claim_anomaly_core::logic::model::{get_default_model_path, load_model, save_model, HyperParams};
use claim_anomaly_core::logic::report::ReportWriter;
use claim_anomaly_core::{AnomalyPipeline, EngineConfig, ModelSource, RunOutput};

#[derive(Parser)]
#[command(name = "claim-anomaly")]
#[command(about = "Flag and explain anomalous healthcare claims")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train the global model and score a feature bundle
    Run {
        /// Feature bundle (JSON)
        bundle: PathBuf,
        /// Output directory (defaults to a per-run folder in the data dir)
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Where to save the trained model
        #[arg(long)]
        model_out: Option<PathBuf>,
        /// Skip the search: latent width, hidden width, learning rate
        #[arg(long, num_args = 3, value_names = ["LATENT", "HIDDEN", "LR"])]
        hyperparams: Option<Vec<f64>>,
    },
    /// Score a feature bundle with a previously saved model
    Score {
        /// Feature bundle (JSON)
        bundle: PathBuf,
        /// Saved model
        #[arg(short, long)]
        model: PathBuf,
        /// Output directory (defaults to a per-run folder in the data dir)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    log::info!("Starting {} v{}", APP_NAME, APP_VERSION);

    match cli.command {
        Commands::Run {
            bundle,
            out,
            model_out,
            hyperparams,
        } => {
            let params = hyperparams.map(|v| parse_hyperparams(&v)).transpose()?;
            run(&bundle, out, model_out, params)
        }
        Commands::Score { bundle, model, out } => score(&bundle, &model, out),
    }
}

fn parse_hyperparams(values: &[f64]) -> Result<HyperParams> {
    match values {
        [latent, hidden, lr] => Ok(HyperParams {
            latent_dim: *latent as usize,
            hidden_dim: *hidden as usize,
            learning_rate: *lr,
        }),
        _ => anyhow::bail!("expected LATENT HIDDEN LR, got {} values", values.len()),
    }
}

fn run(
    bundle: &Path,
    out: Option<PathBuf>,
    model_out: Option<PathBuf>,
    hyperparams: Option<HyperParams>,
) -> Result<()> {
    let parts = load_bundle(bundle)
        .and_then(|b| b.into_parts())
        .with_context(|| format!("reading feature bundle {}", bundle.display()))?;

    let output = AnomalyPipeline::new(EngineConfig::from_env())
        .run_bundle(&parts, ModelSource::Train(hyperparams))
        .context("anomaly run failed")?;

    let model_path = model_out.unwrap_or_else(get_default_model_path);
    save_model(&output.model, &model_path)
        .with_context(|| format!("saving model to {}", model_path.display()))?;

    finish(&output, out)
}

fn score(bundle: &Path, model: &Path, out: Option<PathBuf>) -> Result<()> {
    let parts = load_bundle(bundle)
        .and_then(|b| b.into_parts())
        .with_context(|| format!("reading feature bundle {}", bundle.display()))?;

    let trained = load_model(model, parts.matrix.main_columns())
        .with_context(|| format!("loading model {}", model.display()))?;

    let output = AnomalyPipeline::new(EngineConfig::from_env())
        .run_bundle(&parts, ModelSource::Pretrained(trained))
        .context("anomaly run failed")?;

    finish(&output, out)
}

fn finish(output: &RunOutput, out: Option<PathBuf>) -> Result<()> {
    let writer = match out {
        Some(dir) => ReportWriter::from_path(dir),
        None => ReportWriter::for_run(output),
    };
    let dir = writer
        .write(output)
        .with_context(|| format!("writing results to {}", writer.out_dir().display()))?;

    println!(
        "{} of {} claims flagged ({:.2}%) -> {}",
        output.summary.total_flagged,
        output.summary.total_records,
        output.summary.detection_rate * 100.0,
        dir.display()
    );
    if !output.explanations.root_cause.is_empty() {
        println!("\n{}", output.explanations.root_cause);
    }
    Ok(())
}
