// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Reproducible evaluation pipeline for binary classifiers
//!
//! Orchestrates:
//! - Dataset loading
//! - Classifier training and evaluation
//! - Metrics computation
//! - Results serialization (JSON, Markdown, ROC points as CSV)

use crate::classifiers::{all_classifiers, BinaryClassifier, ClassifierOptions};
use crate::datasets::{Dataset, TabularData};
use crate::metrics::EvaluationMetrics;
use crate::roc::{no_skill_curve, RocCurve};
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Configuration for the evaluation pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Random seed for reproducibility
    pub seed: u64,
    /// Dataset source ("synthetic" or "csv")
    pub dataset_id: String,
    /// Training CSV (dataset_id = "csv")
    pub train_path: Option<String>,
    /// Testing CSV (dataset_id = "csv")
    pub test_path: Option<String>,
    /// Number of generated samples (dataset_id = "synthetic")
    pub synthetic_samples: usize,
    /// Share of positives in the generated data
    pub positive_rate: f64,
    /// Classifiers to run by id or name (empty = all)
    pub classifier_names: Vec<String>,
    pub classifier_options: ClassifierOptions,
    /// Output directory for results
    pub output_dir: String,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            dataset_id: "synthetic".to_string(),
            train_path: None,
            test_path: None,
            synthetic_samples: 1000,
            positive_rate: 0.3,
            classifier_names: vec![],
            classifier_options: ClassifierOptions::default(),
            output_dir: "eval/results".to_string(),
        }
    }
}

/// Results from a single model evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelResult {
    pub model_id: String,
    pub model_name: String,
    pub model_description: String,
    pub metrics: EvaluationMetrics,
    pub predictions_sample: Vec<PredictionSample>,
    pub training_samples: usize,
    pub eval_samples: usize,
}

/// A sample prediction for inspection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionSample {
    pub index: usize,
    pub predicted: u8,
    pub actual: u8,
    pub probability: f64,
    pub correct: bool,
}

/// Complete evaluation results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationResults {
    pub config: EvaluationConfig,
    pub dataset_info: DatasetInfo,
    pub model_results: Vec<ModelResult>,
    /// ROC of a constant scorer on the test labels
    pub no_skill_curve: RocCurve,
    pub summary: EvaluationSummary,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetInfo {
    pub id: String,
    pub name: String,
    pub source: String,
    pub n_features: usize,
    pub train_samples: usize,
    pub test_samples: usize,
    pub label_distribution: HashMap<String, usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationSummary {
    pub best_model: String,
    pub best_f1: f64,
    pub best_accuracy: f64,
    pub best_auc_model: Option<String>,
    pub best_auc: Option<f64>,
    pub model_comparison: Vec<ModelComparison>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelComparison {
    pub model: String,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub auc_roc: Option<f64>,
}

/// Main evaluation pipeline
pub struct EvaluationPipeline {
    config: EvaluationConfig,
    dataset: Option<Dataset>,
}

impl EvaluationPipeline {
    pub fn new(config: EvaluationConfig) -> Self {
        Self {
            config,
            dataset: None,
        }
    }

    /// Use an already loaded dataset instead of the configured source
    pub fn with_dataset(mut self, dataset: Dataset) -> Self {
        self.dataset = Some(dataset);
        self
    }

    /// Load dataset based on configuration
    pub fn load_dataset(&mut self) -> Result<()> {
        let dataset = match self.config.dataset_id.as_str() {
            "synthetic" => {
                tracing::info!(
                    "Loading synthetic dataset ({} samples, seed {})",
                    self.config.synthetic_samples,
                    self.config.seed
                );
                Dataset::load_synthetic(
                    self.config.synthetic_samples,
                    self.config.positive_rate,
                    self.config.seed,
                )?
            }
            "csv" => {
                let (Some(train), Some(test)) = (&self.config.train_path, &self.config.test_path) else {
                    bail!("dataset 'csv' needs both a train and a test path");
                };
                tracing::info!("Loading CSV dataset from {} and {}", train, test);
                Dataset::load_csv(Path::new(train), Path::new(test))?
            }
            other => bail!("Unknown dataset '{}' (expected 'synthetic' or 'csv')", other),
        };

        tracing::info!(
            "Dataset loaded: {} samples (train={}, test={})",
            dataset.total_samples(),
            dataset.train.len(),
            dataset.test.len()
        );
        dataset.log_shapes();

        self.dataset = Some(dataset);
        Ok(())
    }

    fn selected(&self, model: &dyn BinaryClassifier) -> bool {
        self.config.classifier_names.is_empty()
            || self
                .config
                .classifier_names
                .iter()
                .any(|n| n.eq_ignore_ascii_case(model.id()) || n.eq_ignore_ascii_case(model.name()))
    }

    /// Evaluate a single fitted model on the evaluation split
    fn evaluate_model(
        model: &dyn BinaryClassifier,
        train: &TabularData,
        eval: &TabularData,
    ) -> Result<ModelResult> {
        let predictions = model
            .predict_all(&eval.features)
            .with_context(|| format!("{} failed to predict", model.name()))?;

        let metrics = EvaluationMetrics::from_predictions_with_probs(
            &predictions.labels,
            &eval.labels,
            &predictions.probabilities,
        )
        .with_context(|| format!("{} produced predictions that cannot be scored", model.name()))?;

        // Sample predictions for inspection (first 10 errors, first 10 correct)
        let mut predictions_sample = Vec::new();
        let mut errors = 0;
        let mut corrects = 0;

        for (index, (&predicted, &actual)) in predictions.labels.iter().zip(eval.labels.iter()).enumerate() {
            let correct = predicted == actual;
            if (!correct && errors < 10) || (correct && corrects < 10) {
                predictions_sample.push(PredictionSample {
                    index,
                    predicted,
                    actual,
                    probability: predictions.probabilities[index],
                    correct,
                });
                if correct {
                    corrects += 1;
                } else {
                    errors += 1;
                }
            }
            if errors >= 10 && corrects >= 10 {
                break;
            }
        }

        Ok(ModelResult {
            model_id: model.id().to_string(),
            model_name: model.name().to_string(),
            model_description: model.description().to_string(),
            metrics,
            predictions_sample,
            training_samples: train.len(),
            eval_samples: eval.len(),
        })
    }

    /// Run the full evaluation pipeline
    pub fn run(&mut self) -> Result<EvaluationResults> {
        if self.dataset.is_none() {
            self.load_dataset()?;
        }
        let Some(dataset) = self.dataset.as_ref() else {
            bail!("Dataset not loaded");
        };

        let label_dist = Dataset::label_distribution(&dataset.test.labels);
        let dataset_info = DatasetInfo {
            id: dataset.config.id.clone(),
            name: dataset.config.name.clone(),
            source: dataset.config.source.clone(),
            n_features: dataset.train.n_features(),
            train_samples: dataset.train.len(),
            test_samples: dataset.test.len(),
            label_distribution: label_dist
                .iter()
                .map(|(k, v)| (format!("{:?}", k), *v))
                .collect(),
        };

        let mut model_results = Vec::new();

        for mut model in all_classifiers(&self.config.classifier_options) {
            if !self.selected(model.as_ref()) {
                continue;
            }

            tracing::info!("Fitting classifier: {}", model.name());
            model
                .fit(&dataset.train)
                .with_context(|| format!("Failed to fit {}", model.name()))?;

            let result = Self::evaluate_model(model.as_ref(), &dataset.train, &dataset.test)?;

            tracing::info!(
                "  {} - Accuracy: {:.4}, Precision: {:.4}, Recall: {:.4}, F1: {:.4}, AUC: {}",
                result.model_name,
                result.metrics.classification.accuracy,
                result.metrics.classification.precision,
                result.metrics.classification.recall,
                result.metrics.classification.f1_score,
                result.metrics.auc_roc.map_or("-".to_string(), |v| format!("{:.4}", v))
            );

            model_results.push(result);
        }

        if model_results.is_empty() {
            bail!(
                "No classifier matched {:?}",
                self.config.classifier_names
            );
        }

        let no_skill_curve = no_skill_curve(&dataset.test.labels)?;
        let summary = Self::summarize(&model_results);

        Ok(EvaluationResults {
            config: self.config.clone(),
            dataset_info,
            model_results,
            no_skill_curve,
            summary,
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        })
    }

    fn summarize(results: &[ModelResult]) -> EvaluationSummary {
        let mut best_model = "None".to_string();
        let mut best_f1 = -1.0;
        let mut best_accuracy = 0.0;
        let mut best_auc: Option<(String, f64)> = None;

        let model_comparison: Vec<_> = results
            .iter()
            .map(|r| {
                let report = &r.metrics.classification;
                if report.f1_score > best_f1 {
                    best_f1 = report.f1_score;
                    best_accuracy = report.accuracy;
                    best_model = r.model_name.clone();
                }
                if let Some(auc) = r.metrics.auc_roc {
                    if best_auc.as_ref().map_or(true, |(_, best)| auc > *best) {
                        best_auc = Some((r.model_name.clone(), auc));
                    }
                }
                ModelComparison {
                    model: r.model_name.clone(),
                    accuracy: report.accuracy,
                    precision: report.precision,
                    recall: report.recall,
                    f1_score: report.f1_score,
                    auc_roc: r.metrics.auc_roc,
                }
            })
            .collect();

        EvaluationSummary {
            best_model,
            best_f1: best_f1.max(0.0),
            best_accuracy,
            best_auc_model: best_auc.as_ref().map(|(name, _)| name.clone()),
            best_auc: best_auc.map(|(_, auc)| auc),
            model_comparison,
        }
    }

    /// Save results to JSON file
    pub fn save_results(results: &EvaluationResults, output_path: &Path) -> Result<()> {
        std::fs::create_dir_all(output_path.parent().unwrap_or(Path::new(".")))?;
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(output_path, json)
            .with_context(|| format!("Failed to write {}", output_path.display()))?;
        tracing::info!("Results saved to {}", output_path.display());
        Ok(())
    }

    /// Write every ROC point as `model,threshold,fpr,tpr` rows for plotting.
    ///
    /// The no-skill reference is written under the model name "No Skill".
    pub fn save_roc_points(results: &EvaluationResults, output_path: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(output_path.parent().unwrap_or(Path::new(".")))?;
        let mut writer = csv::Writer::from_path(output_path)
            .with_context(|| format!("Failed to create {}", output_path.display()))?;

        writer.write_record(["model", "threshold", "fpr", "tpr"])?;

        let curves = results
            .model_results
            .iter()
            .filter_map(|r| r.metrics.roc_curve.as_ref().map(|c| (r.model_name.as_str(), c)))
            .chain(std::iter::once(("No Skill", &results.no_skill_curve)));

        for (model, curve) in curves {
            for point in &curve.points {
                writer.write_record([
                    model.to_string(),
                    point.threshold.to_string(),
                    point.fpr.to_string(),
                    point.tpr.to_string(),
                ])?;
            }
        }

        writer.flush()?;
        tracing::info!("ROC points saved to {}", output_path.display());
        Ok(output_path.to_path_buf())
    }

    /// Generate a markdown report
    pub fn generate_report(results: &EvaluationResults) -> String {
        let mut report = String::new();

        report.push_str("# Classifier Evaluation Report\n\n");
        report.push_str(&format!("**Generated:** {}\n\n", results.timestamp.format("%Y-%m-%d %H:%M:%S UTC")));
        report.push_str(&format!("**Version:** {}\n\n", results.version));

        report.push_str("## Dataset\n\n");
        report.push_str(&format!("- **ID:** {}\n", results.dataset_info.id));
        report.push_str(&format!("- **Name:** {}\n", results.dataset_info.name));
        report.push_str(&format!("- **Source:** {}\n", results.dataset_info.source));
        report.push_str(&format!("- **Features:** {}\n", results.dataset_info.n_features));
        report.push_str(&format!(
            "- **Split Sizes:** Train={}, Test={}\n\n",
            results.dataset_info.train_samples, results.dataset_info.test_samples
        ));

        report.push_str("## Summary\n\n");
        report.push_str(&format!(
            "**Best Model (F1):** {} (F1={:.4}, Accuracy={:.4})\n\n",
            results.summary.best_model, results.summary.best_f1, results.summary.best_accuracy
        ));
        if let (Some(model), Some(auc)) = (&results.summary.best_auc_model, results.summary.best_auc) {
            report.push_str(&format!("**Best Model (AUC-ROC):** {} (AUC={:.4})\n\n", model, auc));
        }

        report.push_str("### Model Comparison\n\n");
        report.push_str("| Model | Accuracy | Precision | Recall | F1 Score | AUC-ROC |\n");
        report.push_str("|-------|----------|-----------|--------|----------|---------|\n");

        for row in &results.summary.model_comparison {
            let auc = row.auc_roc.map_or("-".to_string(), |v| format!("{:.4}", v));
            report.push_str(&format!(
                "| {} | {:.4} | {:.4} | {:.4} | {:.4} | {} |\n",
                row.model, row.accuracy, row.precision, row.recall, row.f1_score, auc
            ));
        }
        report.push_str(&format!(
            "| No Skill | - | - | - | - | {:.4} |\n",
            results.no_skill_curve.auc
        ));

        report.push_str("\n## Detailed Results\n\n");

        for result in &results.model_results {
            report.push_str(&format!("### {}\n\n", result.model_name));
            report.push_str(&format!("*{}*\n\n", result.model_description));
            report.push_str(&format!("- Training samples: {}\n", result.training_samples));
            report.push_str(&format!("- Evaluation samples: {}\n\n", result.eval_samples));

            report.push_str("#### Performance Metrics\n\n");
            report.push_str(&format!("```\n{}\n```\n\n", result.metrics.format()));
        }

        report.push_str("## Configuration\n\n");
        report.push_str(&format!(
            "```json\n{}\n```\n",
            serde_json::to_string_pretty(&results.config).unwrap_or_default()
        ));

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn synthetic_config() -> EvaluationConfig {
        EvaluationConfig {
            synthetic_samples: 400,
            ..EvaluationConfig::default()
        }
    }

    #[test]
    fn test_pipeline_synthetic() {
        let mut pipeline = EvaluationPipeline::new(synthetic_config());
        let results = pipeline.run().expect("Pipeline should succeed");

        assert_eq!(results.model_results.len(), 2);
        assert!(results.summary.best_f1 >= 0.0);
        assert!(results.summary.best_f1 <= 1.0);
        assert!(results.summary.best_auc.is_some());
        assert_eq!(results.dataset_info.test_samples, 80);
        assert!((results.no_skill_curve.auc - 0.5).abs() < 1e-9);

        for result in &results.model_results {
            let cm = result.metrics.classification.confusion_matrix;
            assert_eq!(cm.total(), result.eval_samples);
            assert!(!result.predictions_sample.is_empty());
        }
    }

    #[test]
    fn test_pipeline_specific_classifiers() {
        let config = EvaluationConfig {
            classifier_names: vec!["dt".to_string()],
            ..synthetic_config()
        };

        let mut pipeline = EvaluationPipeline::new(config);
        let results = pipeline.run().expect("Pipeline should succeed");

        assert_eq!(results.model_results.len(), 1);
        assert_eq!(results.model_results[0].model_name, "Decision Tree");
    }

    #[test]
    fn test_pipeline_unknown_classifier() {
        let config = EvaluationConfig {
            classifier_names: vec!["svm".to_string()],
            ..synthetic_config()
        };

        assert!(EvaluationPipeline::new(config).run().is_err());
    }

    #[test]
    fn test_csv_dataset_requires_paths() {
        let config = EvaluationConfig {
            dataset_id: "csv".to_string(),
            ..EvaluationConfig::default()
        };

        let err = EvaluationPipeline::new(config).run().unwrap_err();
        assert!(err.to_string().contains("train and a test path"));
    }

    #[test]
    fn test_generate_report() {
        let mut pipeline = EvaluationPipeline::new(synthetic_config());
        let results = pipeline.run().expect("Pipeline should succeed");

        let report = EvaluationPipeline::generate_report(&results);

        assert!(report.contains("Classifier Evaluation Report"));
        assert!(report.contains("Model Comparison"));
        assert!(report.contains("Logistic Regression"));
        assert!(report.contains("No Skill"));
    }

    #[test]
    fn test_save_outputs() {
        let dir = tempdir().unwrap();
        let mut pipeline = EvaluationPipeline::new(synthetic_config());
        let results = pipeline.run().unwrap();

        let json_path = dir.path().join("results.json");
        EvaluationPipeline::save_results(&results, &json_path).unwrap();
        let restored: EvaluationResults =
            serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(restored.model_results.len(), results.model_results.len());

        let roc_path = dir.path().join("roc.csv");
        EvaluationPipeline::save_roc_points(&results, &roc_path).unwrap();
        let contents = std::fs::read_to_string(&roc_path).unwrap();
        assert!(contents.starts_with("model,threshold,fpr,tpr"));
        assert!(contents.contains("No Skill,inf,0,0"));
    }
}
