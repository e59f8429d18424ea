// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Error types for metric computation

use thiserror::Error;

/// Failures raised by the metric functions.
///
/// `InvalidInput` is a caller contract violation and always aborts the
/// computation. `UndefinedMetric` marks a zero denominator; the recovering
/// accessors substitute 0.0 for it and log a warning.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MetricsError {
    /// Length mismatch, label outside {0,1}, or probability outside [0,1]
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    /// Metric has a zero denominator for this confusion matrix
    #[error("{metric} is undefined: {reason}")]
    UndefinedMetric {
        metric: &'static str,
        reason: &'static str,
    },
}

impl MetricsError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MetricsError>;

/// Check that `predictions` and `ground_truth` are aligned binary vectors.
pub(crate) fn validate_binary(predictions: &[u8], ground_truth: &[u8]) -> Result<()> {
    if predictions.len() != ground_truth.len() {
        return Err(MetricsError::invalid(format!(
            "predictions length {} != ground truth length {}",
            predictions.len(),
            ground_truth.len()
        )));
    }
    validate_labels("ground truth", ground_truth)?;
    validate_labels("predictions", predictions)
}

pub(crate) fn validate_labels(what: &str, values: &[u8]) -> Result<()> {
    match values.iter().position(|&v| v > 1) {
        Some(idx) => Err(MetricsError::invalid(format!(
            "{} value {} at index {} is not a binary label",
            what, values[idx], idx
        ))),
        None => Ok(()),
    }
}

/// Check that `probabilities` is aligned with `ground_truth` and every value
/// is a finite probability.
pub(crate) fn validate_probabilities(probabilities: &[f64], ground_truth: &[u8]) -> Result<()> {
    if probabilities.len() != ground_truth.len() {
        return Err(MetricsError::invalid(format!(
            "probabilities length {} != ground truth length {}",
            probabilities.len(),
            ground_truth.len()
        )));
    }
    validate_labels("ground truth", ground_truth)?;
    match probabilities
        .iter()
        .position(|p| !p.is_finite() || !(0.0..=1.0).contains(p))
    {
        Some(idx) => Err(MetricsError::invalid(format!(
            "probability {} at index {} is outside [0, 1]",
            probabilities[idx], idx
        ))),
        None => Ok(()),
    }
}
