// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! ROC curve and area under the curve
//!
//! The curve is built by sweeping the decision threshold over every distinct
//! predicted probability, from the highest down. Samples sharing a
//! probability enter the positive side together as one step.

use crate::error::{validate_probabilities, Result};
use serde::{Deserialize, Serialize};

/// A single point on the ROC curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RocPoint {
    /// Samples with probability >= threshold are predicted positive.
    /// The leading origin point uses `+inf`, stored as `null` in JSON.
    #[serde(with = "infinite_as_null")]
    pub threshold: f64,
    /// False positive rate: FP / (FP + TN)
    pub fpr: f64,
    /// True positive rate: TP / (TP + FN)
    pub tpr: f64,
}

/// ROC curve with its trapezoidal AUC
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RocCurve {
    pub points: Vec<RocPoint>,
    pub auc: f64,
    /// Number of positive samples in the ground truth
    pub positives: usize,
    /// Number of negative samples in the ground truth
    pub negatives: usize,
}

impl RocCurve {
    /// True when one class is missing and one of the rates is pinned to 0
    pub fn is_degenerate(&self) -> bool {
        self.positives == 0 || self.negatives == 0
    }

    /// False positive rates, in curve order
    pub fn fpr(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.fpr).collect()
    }

    /// True positive rates, in curve order
    pub fn tpr(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.tpr).collect()
    }
}

/// Compute the ROC curve for `probabilities` of the positive class.
///
/// # Errors
///
/// Returns `InvalidInput` if the slices differ in length, a label is not 0/1,
/// or a probability is not a finite value in [0, 1].
pub fn roc_curve(probabilities: &[f64], ground_truth: &[u8]) -> Result<RocCurve> {
    validate_probabilities(probabilities, ground_truth)?;

    let positives = ground_truth.iter().filter(|&&l| l == 1).count();
    let negatives = ground_truth.len() - positives;

    if !ground_truth.is_empty() && (positives == 0 || negatives == 0) {
        tracing::warn!(
            "ROC input has a single class ({} positive, {} negative); undefined rates set to 0",
            positives,
            negatives
        );
    }

    let mut order: Vec<usize> = (0..probabilities.len()).collect();
    order.sort_by(|&a, &b| probabilities[b].total_cmp(&probabilities[a]));

    let mut points = Vec::with_capacity(order.len() + 1);
    points.push(RocPoint {
        threshold: f64::INFINITY,
        fpr: 0.0,
        tpr: 0.0,
    });

    let mut tp = 0usize;
    let mut fp = 0usize;
    let mut i = 0;

    while i < order.len() {
        let threshold = probabilities[order[i]];
        while i < order.len() && probabilities[order[i]] == threshold {
            if ground_truth[order[i]] == 1 {
                tp += 1;
            } else {
                fp += 1;
            }
            i += 1;
        }

        points.push(RocPoint {
            threshold,
            fpr: rate(fp, negatives),
            tpr: rate(tp, positives),
        });
    }

    let auc = trapezoidal_auc(&points);

    Ok(RocCurve {
        points,
        auc,
        positives,
        negatives,
    })
}

/// Shorthand for `roc_curve(probabilities, ground_truth)?.auc`
pub fn roc_auc(probabilities: &[f64], ground_truth: &[u8]) -> Result<f64> {
    Ok(roc_curve(probabilities, ground_truth)?.auc)
}

/// ROC curve of a scorer that assigns probability 0 to every sample.
///
/// This is the diagonal "no skill" reference drawn next to real models.
pub fn no_skill_curve(ground_truth: &[u8]) -> Result<RocCurve> {
    roc_curve(&vec![0.0; ground_truth.len()], ground_truth)
}

/// Area under a curve given as ordered points, by the trapezoidal rule
pub fn trapezoidal_auc(points: &[RocPoint]) -> f64 {
    points
        .windows(2)
        .map(|w| (w[1].fpr - w[0].fpr) * (w[1].tpr + w[0].tpr) / 2.0)
        .sum()
}

mod infinite_as_null {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_some(value)
        } else {
            serializer.serialize_none()
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::INFINITY))
    }
}

fn rate(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_roc_perfect() {
        let roc = roc_curve(&[0.9, 0.8, 0.2, 0.1], &[1, 1, 0, 0]).unwrap();
        assert!((roc.auc - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_roc_inverted() {
        let roc = roc_curve(&[0.1, 0.2, 0.8, 0.9], &[1, 1, 0, 0]).unwrap();
        assert!(roc.auc.abs() < 1e-12);
    }

    #[test]
    fn test_roc_known_points() {
        // (0.9,1) (0.7,0) (0.5,1) (0.3,0)
        let roc = roc_curve(&[0.9, 0.7, 0.5, 0.3], &[1, 0, 1, 0]).unwrap();
        let coords: Vec<(f64, f64)> = roc.points.iter().map(|p| (p.fpr, p.tpr)).collect();
        assert_eq!(
            coords,
            vec![(0.0, 0.0), (0.0, 0.5), (0.5, 0.5), (0.5, 1.0), (1.0, 1.0)]
        );
        assert!((roc.auc - 0.75).abs() < 1e-12);
        assert!(roc.points[0].threshold.is_infinite());
        assert_eq!(roc.points[1].threshold, 0.9);
    }

    #[test]
    fn test_roc_ties_form_single_step() {
        // Three samples share 0.5: one step, no partial credit inside the tie
        let roc = roc_curve(&[0.5, 0.5, 0.5, 0.1], &[1, 0, 1, 0]).unwrap();
        assert_eq!(roc.points.len(), 3);
        assert!((roc.points[1].fpr - 0.5).abs() < 1e-12);
        assert!((roc.points[1].tpr - 1.0).abs() < 1e-12);
        // Diagonal segment through the tie contributes half its area
        assert!((roc.auc - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_roc_endpoints_and_monotonic() {
        let probs = [0.35, 0.8, 0.1, 0.65, 0.4, 0.9, 0.4, 0.05];
        let labels = [0, 1, 0, 1, 1, 0, 0, 1];
        let roc = roc_curve(&probs, &labels).unwrap();

        let first = roc.points.first().unwrap();
        let last = roc.points.last().unwrap();
        assert_eq!((first.fpr, first.tpr), (0.0, 0.0));
        assert_eq!((last.fpr, last.tpr), (1.0, 1.0));

        for w in roc.points.windows(2) {
            assert!(w[1].fpr >= w[0].fpr);
            assert!(w[1].tpr >= w[0].tpr);
            assert!(w[1].threshold < w[0].threshold);
        }
        assert!(roc.auc >= 0.0 && roc.auc <= 1.0);
    }

    #[test]
    fn test_roc_single_class_rates_are_zero() {
        let roc = roc_curve(&[0.9, 0.4, 0.2], &[1, 1, 1]).unwrap();
        assert!(roc.is_degenerate());
        assert!(roc.points.iter().all(|p| p.fpr == 0.0));
        assert_eq!(roc.points.last().unwrap().tpr, 1.0);
        assert_eq!(roc.auc, 0.0);
    }

    #[test]
    fn test_roc_empty_input() {
        let roc = roc_curve(&[], &[]).unwrap();
        assert_eq!(roc.points.len(), 1);
        assert_eq!(roc.auc, 0.0);
    }

    #[test]
    fn test_roc_rejects_bad_input() {
        assert!(roc_curve(&[0.5], &[1, 0]).is_err());
        assert!(roc_curve(&[0.5, 1.2], &[1, 0]).is_err());
        assert!(roc_curve(&[0.5, 0.4], &[1, 3]).is_err());
    }

    #[test]
    fn test_roc_random_probabilities_near_half() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let n = 20_000;
        let labels: Vec<u8> = (0..n).map(|_| rng.gen_range(0..=1u8)).collect();
        let probs: Vec<f64> = (0..n).map(|_| rng.gen::<f64>()).collect();

        let auc = roc_auc(&probs, &labels).unwrap();
        assert!((auc - 0.5).abs() < 0.03, "auc = {}", auc);
    }

    #[test]
    fn test_origin_threshold_survives_json() {
        let roc = roc_curve(&[0.8, 0.3], &[1, 0]).unwrap();
        let json = serde_json::to_string(&roc).unwrap();
        assert!(json.contains("\"threshold\":null"));

        let restored: RocCurve = serde_json::from_str(&json).unwrap();
        assert!(restored.points[0].threshold.is_infinite());
        assert_eq!(restored.points.len(), roc.points.len());
        assert!((restored.auc - roc.auc).abs() < 1e-12);
    }

    #[test]
    fn test_no_skill_curve_is_diagonal() {
        let roc = no_skill_curve(&[1, 0, 0, 1, 0]).unwrap();
        let coords: Vec<(f64, f64)> = roc.points.iter().map(|p| (p.fpr, p.tpr)).collect();
        assert_eq!(coords, vec![(0.0, 0.0), (1.0, 1.0)]);
        assert!((roc.auc - 0.5).abs() < 1e-12);
    }
}
