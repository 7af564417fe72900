//! Finds the similarity threshold that best separates phrase groups that
//! should cluster from groups that should not.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use phrase_clustering::calibration::{CalibrationConfig, CalibrationCorpus, ThresholdCalibrator};
use phrase_clustering::{ModelConfig, WordVectorModel};

#[derive(Debug, Parser)]
#[command(
    name = "calibrate-threshold",
    about = "Grid-search the suggestion similarity threshold"
)]
struct Args {
    /// Word vector file, one `word v1,v2,...` entry per line
    #[arg(long)]
    model: PathBuf,

    /// Groups of phrases that should cluster together
    #[arg(long, default_value = "data/cluster_these.txt")]
    cluster: PathBuf,

    /// Groups of phrases that should not cluster together
    #[arg(long, default_value = "data/dont_cluster_these.txt")]
    dont_cluster: PathBuf,

    /// Distance between candidate thresholds, in (0, 1]
    #[arg(long, default_value_t = 0.01, value_parser = parse_step)]
    step: f64,

    /// Compute pair similarities in parallel
    #[arg(long)]
    parallel: bool,

    /// Print every within-group pair similarity of the `--cluster` corpus and exit
    #[arg(long)]
    print_similarities: bool,

    /// Print the full sweep as JSON instead of the winning threshold
    #[arg(long)]
    json: bool,
}

fn parse_step(value: &str) -> Result<f64, String> {
    let step: f64 = value
        .parse()
        .map_err(|_| format!("`{value}` is not a number"))?;
    if step.is_finite() && step > 0.0 && step <= 1.0 {
        Ok(step)
    } else {
        Err(format!("step must be in (0, 1], got {step}"))
    }
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let model = WordVectorModel::load(&args.model, ModelConfig::default())
        .with_context(|| format!("loading model {}", args.model.display()))?;
    let config = CalibrationConfig {
        step: args.step,
        parallel: args.parallel,
    };
    let calibrator = ThresholdCalibrator::new(&model, config)?;

    let good = CalibrationCorpus::load(&args.cluster)?;
    if args.print_similarities {
        for pair in calibrator.pair_similarities(&good)? {
            println!("{}/{}: {}", pair.left, pair.right, pair.similarity);
        }
        return Ok(());
    }
    let bad = CalibrationCorpus::load(&args.dont_cluster)?;

    if args.json {
        let sweep = calibrator.sweep(&good, &bad)?;
        println!("{}", serde_json::to_string_pretty(&sweep)?);
    } else {
        let best = calibrator.optimal_threshold(&good, &bad)?;
        println!("threshold {:.2} score {:.4}", best.threshold, best.score);
    }
    Ok(())
}
