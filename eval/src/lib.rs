// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Evaluation toolkit for binary classifiers
//!
//! This crate provides:
//! - Evaluation metrics (Confusion Matrix, Accuracy, Precision, Recall, F1)
//! - ROC curves and AUC-ROC from predicted probabilities
//! - Tabular dataset loading (CSV train/test pairs, seeded synthetic data)
//! - Logistic regression and decision tree classifiers backed by linfa
//! - Reproducible evaluation pipeline with JSON / Markdown / CSV outputs

pub mod classifiers;
pub mod datasets;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod roc;

pub use classifiers::{
    BinaryClassifier, ClassifierOptions, DecisionTreeClassifier, LogisticRegressionClassifier,
    Predictions,
};
pub use datasets::{Dataset, DatasetConfig, Label, PredictionColumns, ScoredPredictions, TabularData};
pub use error::MetricsError;
pub use metrics::{ClassificationReport, ConfusionMatrix, EvaluationMetrics};
pub use pipeline::{EvaluationConfig, EvaluationPipeline, EvaluationResults};
pub use roc::{roc_auc, roc_curve, RocCurve, RocPoint};
