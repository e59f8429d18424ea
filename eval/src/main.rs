// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Evaluation pipeline CLI: fits logistic regression and a decision tree
//! on the same data and compares their metrics
//!
//! Usage:
//!   eval-pipeline --dataset synthetic --seed 42
//!   eval-pipeline --dataset csv --train data/train.csv --test data/test.csv

use anyhow::{bail, Result};
use clap::Parser;
use classification_eval::classifiers::ClassifierOptions;
use classification_eval::pipeline::{EvaluationConfig, EvaluationPipeline};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "eval-pipeline")]
#[command(about = "Train and compare binary classifiers")]
#[command(version)]
struct Args {
    /// Dataset to evaluate on (synthetic, csv)
    #[arg(short, long, default_value = "synthetic")]
    dataset: String,

    /// Training CSV, label in the last column
    #[arg(long)]
    train: Option<PathBuf>,

    /// Testing CSV, label in the last column
    #[arg(long)]
    test: Option<PathBuf>,

    /// Random seed for reproducibility
    #[arg(short, long, default_value_t = 42)]
    seed: u64,

    /// Number of samples for the synthetic dataset
    #[arg(short = 'n', long, default_value_t = 1000)]
    samples: usize,

    /// Share of positives in the synthetic dataset
    #[arg(long, default_value_t = 0.3)]
    positive_rate: f64,

    /// Specific classifiers to run (comma-separated ids or names, empty = all)
    #[arg(short, long)]
    classifiers: Option<String>,

    /// Maximum decision tree depth (unbounded when omitted)
    #[arg(long)]
    max_depth: Option<usize>,

    /// Maximum logistic regression iterations
    #[arg(long, default_value_t = 100)]
    max_iterations: u64,

    /// Output directory for results
    #[arg(short, long, default_value = "eval/results")]
    output: PathBuf,

    /// Output format (json, markdown, both)
    #[arg(short, long, default_value = "both")]
    format: String,
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    if !matches!(args.format.as_str(), "json" | "markdown" | "both") {
        bail!("Unknown output format '{}' (expected json, markdown or both)", args.format);
    }

    tracing::info!("Binary Classifier Evaluation Pipeline");
    tracing::info!("Dataset: {}", args.dataset);
    tracing::info!("Seed: {}", args.seed);

    let classifier_names: Vec<String> = args
        .classifiers
        .map(|c| c.split(',').map(|s| s.trim().to_string()).collect())
        .unwrap_or_default();

    let config = EvaluationConfig {
        seed: args.seed,
        dataset_id: args.dataset.clone(),
        train_path: args.train.map(|p| p.to_string_lossy().to_string()),
        test_path: args.test.map(|p| p.to_string_lossy().to_string()),
        synthetic_samples: args.samples,
        positive_rate: args.positive_rate,
        classifier_names,
        classifier_options: ClassifierOptions {
            max_iterations: args.max_iterations,
            max_depth: args.max_depth,
        },
        output_dir: args.output.to_string_lossy().to_string(),
    };

    let mut pipeline = EvaluationPipeline::new(config);
    let results = pipeline.run()?;

    // Print summary to console
    println!("\n{}", "=".repeat(78));
    println!("EVALUATION SUMMARY");
    println!("{}", "=".repeat(78));
    println!(
        "\nBest Model: {} (F1={:.4})",
        results.summary.best_model, results.summary.best_f1
    );
    println!("\nModel Comparison:");
    println!("{:-<78}", "");
    println!(
        "{:<20} {:>10} {:>10} {:>10} {:>10} {:>10}",
        "Model", "Accuracy", "Precision", "Recall", "F1", "AUC-ROC"
    );
    println!("{:-<78}", "");

    for row in &results.summary.model_comparison {
        let auc = row.auc_roc.map_or("-".to_string(), |v| format!("{:.4}", v));
        println!(
            "{:<20} {:>10.4} {:>10.4} {:>10.4} {:>10.4} {:>10}",
            row.model, row.accuracy, row.precision, row.recall, row.f1_score, auc
        );
    }
    println!(
        "{:<20} {:>10} {:>10} {:>10} {:>10} {:>10.4}",
        "No Skill", "-", "-", "-", "-", results.no_skill_curve.auc
    );
    println!("{:-<78}", "");

    for result in &results.model_results {
        println!("\n## {} ##", result.model_name);
        println!("{}", result.metrics.format());
    }

    // Save outputs
    std::fs::create_dir_all(&args.output)?;

    let timestamp = results.timestamp.format("%Y%m%d_%H%M%S");

    if args.format == "json" || args.format == "both" {
        let json_path = args
            .output
            .join(format!("eval_{}_{}.json", args.dataset, timestamp));
        EvaluationPipeline::save_results(&results, &json_path)?;
        println!("\nJSON results saved to: {}", json_path.display());
    }

    if args.format == "markdown" || args.format == "both" {
        let report = EvaluationPipeline::generate_report(&results);
        let md_path = args
            .output
            .join(format!("eval_{}_{}.md", args.dataset, timestamp));
        std::fs::write(&md_path, report)?;
        println!("Markdown report saved to: {}", md_path.display());
    }

    let roc_path = args
        .output
        .join(format!("roc_{}_{}.csv", args.dataset, timestamp));
    EvaluationPipeline::save_roc_points(&results, &roc_path)?;
    println!("ROC points saved to: {}", roc_path.display());

    println!("\nEvaluation complete!");

    Ok(())
}
