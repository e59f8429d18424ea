// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Property tests for the binary metrics
//!
//! - Confusion matrix counts partition the samples
//! - Rates stay in [0, 1] and never become NaN
//! - ROC curves are monotone and end at (1, 1) when both classes occur

use classification_eval::metrics::{ClassificationReport, ConfusionMatrix};
use classification_eval::roc::roc_curve;
use proptest::collection::vec;
use proptest::prelude::*;

// =============================================================================
// Strategy Helpers
// =============================================================================

/// Prediction and ground truth vectors of the same length
fn label_pair(len: std::ops::Range<usize>) -> impl Strategy<Value = (Vec<u8>, Vec<u8>)> {
    len.prop_flat_map(|l| (vec(0..=1u8, l), vec(0..=1u8, l)))
}

/// Probabilities with aligned labels; probabilities are drawn from a coarse
/// grid so that ties are common
fn scored_labels(len: std::ops::Range<usize>) -> impl Strategy<Value = (Vec<f64>, Vec<u8>)> {
    len.prop_flat_map(|l| {
        (
            vec((0..=20u32).prop_map(|k| f64::from(k) / 20.0), l),
            vec(0..=1u8, l),
        )
    })
}

fn in_unit_interval(value: f64) -> bool {
    value.is_finite() && (0.0..=1.0).contains(&value)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    // -------------------------------------------------------------------------
    // Confusion Matrix
    // -------------------------------------------------------------------------

    #[test]
    fn prop_counts_sum_to_samples((pred, truth) in label_pair(0..200)) {
        let cm = ConfusionMatrix::from_predictions(&pred, &truth).unwrap();

        prop_assert_eq!(cm.total(), pred.len());
        prop_assert_eq!(cm.positives(), truth.iter().filter(|&&l| l == 1).count());

        let [[tn, fp], [fn_, tp]] = cm.as_matrix();
        prop_assert_eq!((tn, fp, fn_, tp), (cm.tn, cm.fp, cm.fn_, cm.tp));
    }

    #[test]
    fn prop_rates_bounded((pred, truth) in label_pair(0..200)) {
        let report = ClassificationReport::from_predictions(&pred, &truth).unwrap();

        prop_assert!(in_unit_interval(report.accuracy), "accuracy {}", report.accuracy);
        prop_assert!(in_unit_interval(report.precision), "precision {}", report.precision);
        prop_assert!(in_unit_interval(report.recall), "recall {}", report.recall);
        prop_assert!(in_unit_interval(report.f1_score), "f1 {}", report.f1_score);
        prop_assert!(report.mcc.is_finite() && report.mcc.abs() <= 1.0 + 1e-12, "mcc {}", report.mcc);
    }

    #[test]
    fn prop_f1_between_precision_and_recall((pred, truth) in label_pair(1..200)) {
        let cm = ConfusionMatrix::from_predictions(&pred, &truth).unwrap();
        let (p, r, f1) = (cm.precision(), cm.recall(), cm.f1_score());

        prop_assert!(f1 <= p.max(r) + 1e-12);
        prop_assert!(f1 >= p.min(r) - 1e-12 || f1 == 0.0);
    }

    #[test]
    fn prop_identical_labels_are_perfect(truth in vec(0..=1u8, 1..200)) {
        let cm = ConfusionMatrix::from_predictions(&truth, &truth).unwrap();

        prop_assert_eq!(cm.accuracy(), 1.0);
        prop_assert_eq!(cm.fp + cm.fn_, 0);
        if truth.contains(&1) {
            prop_assert_eq!(cm.precision(), 1.0);
            prop_assert_eq!(cm.recall(), 1.0);
            prop_assert_eq!(cm.f1_score(), 1.0);
        }
    }

    #[test]
    fn prop_complement_has_zero_accuracy(truth in vec(0..=1u8, 1..200)) {
        let flipped: Vec<u8> = truth.iter().map(|&l| 1 - l).collect();
        let cm = ConfusionMatrix::from_predictions(&flipped, &truth).unwrap();

        prop_assert_eq!(cm.accuracy(), 0.0);
        prop_assert_eq!(cm.f1_score(), 0.0);
    }

    #[test]
    fn prop_length_mismatch_rejected(
        pred in vec(0..=1u8, 0..50),
        truth in vec(0..=1u8, 0..50),
    ) {
        prop_assume!(pred.len() != truth.len());
        prop_assert!(ConfusionMatrix::from_predictions(&pred, &truth).is_err());
    }

    // -------------------------------------------------------------------------
    // ROC Curve
    // -------------------------------------------------------------------------

    #[test]
    fn prop_roc_monotone((probs, truth) in scored_labels(0..200)) {
        let roc = roc_curve(&probs, &truth).unwrap();

        prop_assert_eq!((roc.points[0].fpr, roc.points[0].tpr), (0.0, 0.0));
        for w in roc.points.windows(2) {
            prop_assert!(w[1].fpr >= w[0].fpr);
            prop_assert!(w[1].tpr >= w[0].tpr);
            prop_assert!(w[1].threshold < w[0].threshold);
        }
        // Trapezoid sums may overshoot by rounding
        prop_assert!(roc.auc >= 0.0 && roc.auc <= 1.0 + 1e-12, "auc {}", roc.auc);
    }

    #[test]
    fn prop_roc_reaches_top_right((probs, truth) in scored_labels(2..200)) {
        prop_assume!(truth.contains(&0) && truth.contains(&1));
        let roc = roc_curve(&probs, &truth).unwrap();

        let last = roc.points[roc.points.len() - 1];
        prop_assert_eq!((last.fpr, last.tpr), (1.0, 1.0));
    }

    #[test]
    fn prop_auc_flips_with_scores((probs, truth) in scored_labels(2..200)) {
        prop_assume!(truth.contains(&0) && truth.contains(&1));
        let flipped: Vec<f64> = probs.iter().map(|p| 1.0 - p).collect();

        let auc = roc_curve(&probs, &truth).unwrap().auc;
        let flipped_auc = roc_curve(&flipped, &truth).unwrap().auc;
        prop_assert!((auc + flipped_auc - 1.0).abs() < 1e-9, "{} + {}", auc, flipped_auc);
    }
}
