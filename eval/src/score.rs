// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Score predictions produced elsewhere
//!
//! Reads a CSV with ground truth and model output and prints the metrics
//! without training anything.

use anyhow::{Context, Result};
use clap::Parser;
use classification_eval::datasets::{Dataset, Label, PredictionColumns, ScoredPredictions};
use classification_eval::metrics::EvaluationMetrics;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "score-predictions")]
#[command(about = "Compute binary classification metrics for a predictions CSV")]
#[command(version)]
struct Args {
    /// CSV file with a header row
    #[arg(short, long)]
    input: PathBuf,

    /// Column holding the 0/1 ground truth
    #[arg(long, default_value = "label")]
    label_column: String,

    /// Column holding the 0/1 prediction
    #[arg(long, default_value = "prediction")]
    prediction_column: String,

    /// Column holding the probability of label 1 (skipped if absent)
    #[arg(long, default_value = "probability")]
    probability_column: String,

    /// Cut-off applied to probabilities when there is no prediction column
    #[arg(short, long, default_value_t = 0.5)]
    threshold: f64,

    /// Print the metrics as JSON instead of a text report
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let columns = PredictionColumns {
        label: args.label_column,
        prediction: args.prediction_column,
        probability: Some(args.probability_column),
        threshold: args.threshold,
    };

    let scored = ScoredPredictions::load_csv(&args.input, &columns)?;
    tracing::info!(
        "Loaded {} rows from {}{}",
        scored.labels.len(),
        args.input.display(),
        if scored.probabilities.is_some() { " with probabilities" } else { "" }
    );

    let metrics = match &scored.probabilities {
        Some(probabilities) => EvaluationMetrics::from_predictions_with_probs(
            &scored.predictions,
            &scored.labels,
            probabilities,
        ),
        None => EvaluationMetrics::from_predictions(&scored.predictions, &scored.labels),
    }
    .with_context(|| format!("Cannot score {}", args.input.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&metrics)?);
        return Ok(());
    }

    let distribution = Dataset::label_distribution(&scored.labels);
    println!("Ground truth:");
    for label in [Label::Negative, Label::Positive] {
        let count = distribution.get(&label).copied().unwrap_or(0);
        let share = if scored.labels.is_empty() {
            0.0
        } else {
            count as f64 / scored.labels.len() as f64 * 100.0
        };
        println!("  {:?}: {} ({:.1}%)", label, count, share);
    }
    println!();
    println!("{}", metrics.format());

    Ok(())
}
