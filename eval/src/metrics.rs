// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Evaluation metrics for binary classification
//!
//! Implements:
//! - Confusion Matrix
//! - Accuracy, Precision, Recall, F1-Score
//! - Specificity, Balanced Accuracy, Matthews Correlation Coefficient (MCC)
//! - AUC-ROC and Brier score (for probabilistic predictions)
//!
//! Rates with a zero denominator come in two flavours: `try_*` returns
//! `MetricsError::UndefinedMetric`, the plain accessor substitutes 0.0 and
//! logs a warning.

use crate::error::{validate_binary, validate_probabilities, MetricsError, Result};
use crate::roc::{roc_auc, roc_curve, RocCurve};
use serde::{Deserialize, Serialize};

/// Confusion matrix for binary classification (1 = positive, 0 = negative)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    /// True Positives (positive predicted as positive)
    pub tp: usize,
    /// True Negatives (negative predicted as negative)
    pub tn: usize,
    /// False Positives (negative predicted as positive)
    pub fp: usize,
    /// False Negatives (positive predicted as negative)
    pub fn_: usize,
}

impl ConfusionMatrix {
    /// Create from predictions and ground truth labels
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the lengths differ or any value is not 0/1.
    pub fn from_predictions(predictions: &[u8], ground_truth: &[u8]) -> Result<Self> {
        validate_binary(predictions, ground_truth)?;

        let mut matrix = Self::default();

        for (pred, truth) in predictions.iter().zip(ground_truth.iter()) {
            match (*pred, *truth) {
                (1, 1) => matrix.tp += 1,
                (0, 0) => matrix.tn += 1,
                (1, 0) => matrix.fp += 1,
                _ => matrix.fn_ += 1,
            }
        }

        Ok(matrix)
    }

    pub fn from_counts(tp: usize, tn: usize, fp: usize, fn_: usize) -> Self {
        Self { tp, tn, fp, fn_ }
    }

    /// Total number of samples
    pub fn total(&self) -> usize {
        self.tp + self.tn + self.fp + self.fn_
    }

    /// Number of actual positives (TP + FN)
    pub fn positives(&self) -> usize {
        self.tp + self.fn_
    }

    /// Number of actual negatives (TN + FP)
    pub fn negatives(&self) -> usize {
        self.tn + self.fp
    }

    /// Counts in the conventional negative-first layout, rows = actual,
    /// columns = predicted: `[[TN, FP], [FN, TP]]`
    pub fn as_matrix(&self) -> [[usize; 2]; 2] {
        [[self.tn, self.fp], [self.fn_, self.tp]]
    }

    /// Accuracy: (TP + TN) / Total
    pub fn try_accuracy(&self) -> Result<f64> {
        let total = self.total();
        if total == 0 {
            return Err(MetricsError::UndefinedMetric {
                metric: "accuracy",
                reason: "confusion matrix is empty",
            });
        }
        Ok((self.tp + self.tn) as f64 / total as f64)
    }

    /// Precision: TP / (TP + FP)
    pub fn try_precision(&self) -> Result<f64> {
        let denom = self.tp + self.fp;
        if denom == 0 {
            return Err(MetricsError::UndefinedMetric {
                metric: "precision",
                reason: "no positive predictions (TP + FP = 0)",
            });
        }
        Ok(self.tp as f64 / denom as f64)
    }

    /// Recall (Sensitivity): TP / (TP + FN)
    pub fn try_recall(&self) -> Result<f64> {
        let denom = self.tp + self.fn_;
        if denom == 0 {
            return Err(MetricsError::UndefinedMetric {
                metric: "recall",
                reason: "no positive samples (TP + FN = 0)",
            });
        }
        Ok(self.tp as f64 / denom as f64)
    }

    pub fn accuracy(&self) -> f64 {
        recover(self.try_accuracy(), None)
    }

    pub fn precision(&self) -> f64 {
        recover(self.try_precision(), None)
    }

    pub fn recall(&self) -> f64 {
        recover(self.try_recall(), None)
    }

    /// F1 Score: 2 * (Precision * Recall) / (Precision + Recall)
    pub fn f1_score(&self) -> f64 {
        f1_from(self.precision(), self.recall())
    }

    /// Specificity: TN / (TN + FP)
    pub fn specificity(&self) -> f64 {
        let denom = self.tn + self.fp;
        if denom == 0 {
            return 0.0;
        }
        self.tn as f64 / denom as f64
    }

    /// Matthews Correlation Coefficient, in [-1, 1]
    pub fn mcc(&self) -> f64 {
        let tp = self.tp as f64;
        let tn = self.tn as f64;
        let fp = self.fp as f64;
        let fn_ = self.fn_ as f64;

        let numerator = tp * tn - fp * fn_;
        let denominator = ((tp + fp) * (tp + fn_) * (tn + fp) * (tn + fn_)).sqrt();

        if denominator == 0.0 {
            return 0.0;
        }
        numerator / denominator
    }
}

/// F1 from already computed precision and recall; 0 when both are 0
pub fn f1_from(precision: f64, recall: f64) -> f64 {
    let denom = precision + recall;
    if denom == 0.0 {
        return 0.0;
    }
    2.0 * precision * recall / denom
}

fn recover(result: Result<f64>, warnings: Option<&mut Vec<String>>) -> f64 {
    result.unwrap_or_else(|err| {
        tracing::warn!("{}; using 0", err);
        if let Some(warnings) = warnings {
            warnings.push(err.to_string());
        }
        0.0
    })
}

/// Full classification report with all label-based metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub confusion_matrix: ConfusionMatrix,
    pub accuracy: f64,
    pub balanced_accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub specificity: f64,
    pub mcc: f64,
    pub support: usize,
    /// Metrics that were undefined and replaced by 0
    pub warnings: Vec<String>,
}

impl ClassificationReport {
    /// Generate full report from confusion matrix
    pub fn from_confusion_matrix(cm: ConfusionMatrix) -> Self {
        let mut warnings = Vec::new();
        let accuracy = recover(cm.try_accuracy(), Some(&mut warnings));
        let precision = recover(cm.try_precision(), Some(&mut warnings));
        let recall = recover(cm.try_recall(), Some(&mut warnings));
        let specificity = cm.specificity();

        Self {
            accuracy,
            balanced_accuracy: (recall + specificity) / 2.0,
            precision,
            recall,
            f1_score: f1_from(precision, recall),
            specificity,
            mcc: cm.mcc(),
            support: cm.total(),
            confusion_matrix: cm,
            warnings,
        }
    }

    /// Generate report from predictions and ground truth
    pub fn from_predictions(predictions: &[u8], ground_truth: &[u8]) -> Result<Self> {
        let cm = ConfusionMatrix::from_predictions(predictions, ground_truth)?;
        Ok(Self::from_confusion_matrix(cm))
    }

    /// Format as a human-readable string
    pub fn format(&self) -> String {
        let [[tn, fp], [fn_, tp]] = self.confusion_matrix.as_matrix();
        let mut output = format!(
            r#"Classification Report
=====================
Accuracy:          {:.4} ({:.2}%)
Balanced Accuracy: {:.4} ({:.2}%)
Precision:         {:.4}
Recall:            {:.4}
F1 Score:          {:.4}
MCC:               {:.4}
Specificity:       {:.4}
Support:           {}

Confusion Matrix (rows = actual, cols = predicted):
                  Pred 0    Pred 1
Actual 0         {:>6}    {:>6}
       1         {:>6}    {:>6}
"#,
            self.accuracy,
            self.accuracy * 100.0,
            self.balanced_accuracy,
            self.balanced_accuracy * 100.0,
            self.precision,
            self.recall,
            self.f1_score,
            self.mcc,
            self.specificity,
            self.support,
            tn,
            fp,
            fn_,
            tp,
        );

        for warning in &self.warnings {
            output.push_str(&format!("warning: {}\n", warning));
        }

        output
    }
}

/// Complete evaluation metrics including probabilistic metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    pub classification: ClassificationReport,
    /// ROC curve over predicted probabilities
    pub roc_curve: Option<RocCurve>,
    /// AUC-ROC score (if probabilities available)
    pub auc_roc: Option<f64>,
    /// AUC computed from the hard 0/1 predictions
    pub label_auc: f64,
    /// Brier score (calibration metric)
    pub brier_score: Option<f64>,
}

impl EvaluationMetrics {
    /// Create from predictions without probabilities
    pub fn from_predictions(predictions: &[u8], ground_truth: &[u8]) -> Result<Self> {
        let classification = ClassificationReport::from_predictions(predictions, ground_truth)?;

        let as_scores: Vec<f64> = predictions.iter().map(|&p| f64::from(p)).collect();
        let label_auc = roc_auc(&as_scores, ground_truth)?;

        Ok(Self {
            classification,
            roc_curve: None,
            auc_roc: None,
            label_auc,
            brier_score: None,
        })
    }

    /// Create from predictions with probability scores for the positive class
    pub fn from_predictions_with_probs(
        predictions: &[u8],
        ground_truth: &[u8],
        probabilities: &[f64],
    ) -> Result<Self> {
        let mut metrics = Self::from_predictions(predictions, ground_truth)?;

        let roc = roc_curve(probabilities, ground_truth)?;
        metrics.auc_roc = Some(roc.auc);
        metrics.roc_curve = Some(roc);
        metrics.brier_score = Some(Self::brier_score(ground_truth, probabilities)?);

        Ok(metrics)
    }

    /// Calculate Brier score (lower is better)
    pub fn brier_score(ground_truth: &[u8], probabilities: &[f64]) -> Result<f64> {
        validate_probabilities(probabilities, ground_truth)?;

        if ground_truth.is_empty() {
            return Ok(1.0);
        }

        let sum: f64 = ground_truth
            .iter()
            .zip(probabilities.iter())
            .map(|(&label, prob)| (prob - f64::from(label)).powi(2))
            .sum();

        Ok(sum / ground_truth.len() as f64)
    }

    /// Format as human-readable string
    pub fn format(&self) -> String {
        let mut output = self.classification.format();

        if let Some(auc) = self.auc_roc {
            output.push_str(&format!("\nAUC-ROC:           {:.4}\n", auc));
        }
        output.push_str(&format!("AUC (hard labels): {:.4}\n", self.label_auc));
        if let Some(brier) = self.brier_score {
            output.push_str(&format!("Brier Score:       {:.4}\n", brier));
        }

        output
    }
}
