// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Tabular dataset loading for classifier evaluation
//!
//! Two sources are supported: a pair of train/test CSV files whose last
//! column is the 0/1 label, and a seeded synthetic generator for tests and
//! demos.

use anyhow::{bail, Context, Result};
use ndarray::Array2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

/// Binary class label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    Negative,
    Positive,
}

impl Label {
    pub fn to_binary(&self) -> u8 {
        match self {
            Label::Negative => 0,
            Label::Positive => 1,
        }
    }

    /// Create from binary value (1 = positive, anything else = negative)
    pub fn from_binary(value: u8) -> Self {
        if value == 1 {
            Label::Positive
        } else {
            Label::Negative
        }
    }
}

/// Feature matrix with aligned binary labels
#[derive(Debug, Clone)]
pub struct TabularData {
    pub feature_names: Vec<String>,
    /// Row-major `n_samples x n_features`
    pub features: Array2<f64>,
    pub labels: Vec<u8>,
}

impl TabularData {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }
}

/// Descriptive information about a dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    pub id: String,
    pub name: String,
    pub description: String,
    pub source: String,
}

/// A loaded dataset ready for evaluation
#[derive(Debug, Clone)]
pub struct Dataset {
    pub config: DatasetConfig,
    pub train: TabularData,
    pub test: TabularData,
}

const SYNTHETIC_FEATURES: usize = 4;

impl Dataset {
    /// Load a train/test pair of CSV files.
    ///
    /// Both files need a header row. Every column except the last is a
    /// numeric feature; the last column is the label and must be 0 or 1.
    pub fn load_csv(train_path: &Path, test_path: &Path) -> Result<Self> {
        let train = Self::load_csv_split(train_path)?;
        let test = Self::load_csv_split(test_path)?;

        if train.feature_names != test.feature_names {
            bail!(
                "Feature columns differ between {} ({} columns) and {} ({} columns)",
                train_path.display(),
                train.n_features(),
                test_path.display(),
                test.n_features()
            );
        }

        let config = DatasetConfig {
            id: "csv".to_string(),
            name: train_path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| "csv".to_string()),
            description: format!("{} feature columns, label in last column", train.n_features()),
            source: format!("{} / {}", train_path.display(), test_path.display()),
        };

        Ok(Self { config, train, test })
    }

    fn load_csv_split(path: &Path) -> Result<TabularData> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        let headers = reader
            .headers()
            .with_context(|| format!("Failed to read header of {}", path.display()))?
            .clone();

        if headers.len() < 2 {
            bail!(
                "{} needs at least one feature column and a label column",
                path.display()
            );
        }

        let n_features = headers.len() - 1;
        let feature_names: Vec<String> = headers.iter().take(n_features).map(str::to_string).collect();

        let mut values = Vec::new();
        let mut labels = Vec::new();

        for (idx, result) in reader.records().enumerate() {
            let record = result
                .with_context(|| format!("Failed to read record {} in {}", idx, path.display()))?;

            for (col, field) in record.iter().take(n_features).enumerate() {
                let value: f64 = field.parse().with_context(|| {
                    format!(
                        "Non-numeric value '{}' in column '{}' at record {} of {}",
                        field,
                        feature_names[col],
                        idx,
                        path.display()
                    )
                })?;
                values.push(value);
            }

            let raw_label = record.get(n_features).unwrap_or("");
            let label = parse_label(raw_label)
                .with_context(|| format!("Bad label at record {} of {}", idx, path.display()))?;
            labels.push(label);
        }

        let features = Array2::from_shape_vec((labels.len(), n_features), values)
            .with_context(|| format!("Inconsistent row widths in {}", path.display()))?;

        Ok(TabularData {
            feature_names,
            features,
            labels,
        })
    }

    /// Generate a seeded synthetic dataset with an 80/20 train/test split.
    ///
    /// Positives are drawn with probability `positive_rate`. Their first
    /// three features are shifted upwards by increasing amounts; the fourth
    /// feature is pure noise.
    pub fn load_synthetic(size: usize, positive_rate: f64, seed: u64) -> Result<Self> {
        if !(0.0..=1.0).contains(&positive_rate) {
            bail!("positive rate {} is outside [0, 1]", positive_rate);
        }

        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let config = DatasetConfig {
            id: "synthetic".to_string(),
            name: "Synthetic Test Dataset".to_string(),
            description: format!(
                "Generated dataset, {} samples, positive rate {:.2}",
                size, positive_rate
            ),
            source: "generated".to_string(),
        };

        let shifts = [1.5, 1.0, 0.5, 0.0];
        let mut rows: Vec<[f64; SYNTHETIC_FEATURES]> = Vec::with_capacity(size);
        let mut labels: Vec<u8> = Vec::with_capacity(size);

        for _ in 0..size {
            let is_positive = rng.gen_bool(positive_rate);
            let sign = if is_positive { 1.0 } else { -1.0 };

            let mut row = [0.0; SYNTHETIC_FEATURES];
            for (value, shift) in row.iter_mut().zip(shifts.iter()) {
                *value = sign * shift + rng.gen_range(-2.0..2.0);
            }

            rows.push(row);
            labels.push(u8::from(is_positive));
        }

        let feature_names: Vec<String> = (0..SYNTHETIC_FEATURES)
            .map(|j| format!("feature_{}", j))
            .collect();

        let train_end = (size as f64 * 0.8) as usize;
        let split = |range: std::ops::Range<usize>| {
            let slice = &rows[range.clone()];
            TabularData {
                feature_names: feature_names.clone(),
                features: Array2::from_shape_fn((slice.len(), SYNTHETIC_FEATURES), |(i, j)| slice[i][j]),
                labels: labels[range].to_vec(),
            }
        };

        let train = split(0..train_end);
        let test = split(train_end..size);

        Ok(Self { config, train, test })
    }

    /// Get total number of samples across all splits
    pub fn total_samples(&self) -> usize {
        self.train.len() + self.test.len()
    }

    /// Get label distribution for a label vector
    pub fn label_distribution(labels: &[u8]) -> HashMap<Label, usize> {
        let mut dist = HashMap::new();
        for &label in labels {
            *dist.entry(Label::from_binary(label)).or_insert(0) += 1;
        }
        dist
    }

    /// Log the shape of every split
    pub fn log_shapes(&self) {
        for (name, split) in [("train", &self.train), ("test", &self.test)] {
            tracing::info!(
                "{} split: X = ({}, {}), y = ({},)",
                name,
                split.features.nrows(),
                split.features.ncols(),
                split.labels.len()
            );
        }
    }
}

/// Column names of an externally produced predictions file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionColumns {
    pub label: String,
    /// Hard 0/1 prediction; derived from the probability when absent
    pub prediction: String,
    pub probability: Option<String>,
    /// Probability cut-off used when the file has no prediction column
    pub threshold: f64,
}

impl Default for PredictionColumns {
    fn default() -> Self {
        Self {
            label: "label".to_string(),
            prediction: "prediction".to_string(),
            probability: Some("probability".to_string()),
            threshold: 0.5,
        }
    }
}

/// Ground truth with the predictions an external model made for it
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPredictions {
    pub labels: Vec<u8>,
    pub predictions: Vec<u8>,
    pub probabilities: Option<Vec<f64>>,
}

impl ScoredPredictions {
    /// Load a predictions CSV with a header row.
    ///
    /// The label column is required. At least one of the prediction and
    /// probability columns must be present; a missing probability column is
    /// not an error.
    pub fn load_csv(path: &Path, columns: &PredictionColumns) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open predictions file: {}", path.display()))?;
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        let headers = reader
            .headers()
            .with_context(|| format!("Failed to read header of {}", path.display()))?
            .clone();
        let find = |name: &str| headers.iter().position(|h| h == name);

        let Some(label_idx) = find(&columns.label) else {
            bail!("{} has no '{}' column", path.display(), columns.label);
        };
        let prediction_idx = find(&columns.prediction);
        let probability_idx = columns.probability.as_deref().and_then(|name| find(name));

        if prediction_idx.is_none() && probability_idx.is_none() {
            bail!(
                "{} needs a '{}' column or a probability column",
                path.display(),
                columns.prediction
            );
        }

        let mut labels = Vec::new();
        let mut predictions = Vec::new();
        let mut probabilities = Vec::new();

        for (idx, result) in reader.records().enumerate() {
            let record = result
                .with_context(|| format!("Failed to read record {} in {}", idx, path.display()))?;
            let field = |col: usize| record.get(col).unwrap_or("");

            labels.push(
                parse_label(field(label_idx))
                    .with_context(|| format!("Bad label at record {} of {}", idx, path.display()))?,
            );

            let probability = match probability_idx {
                Some(col) => {
                    let value: f64 = field(col).parse().with_context(|| {
                        format!("Bad probability at record {} of {}", idx, path.display())
                    })?;
                    probabilities.push(value);
                    Some(value)
                }
                None => None,
            };

            let prediction = match (prediction_idx, probability) {
                (Some(col), _) => parse_label(field(col)).with_context(|| {
                    format!("Bad prediction at record {} of {}", idx, path.display())
                })?,
                (None, probability) => {
                    u8::from(probability.is_some_and(|p| p >= columns.threshold))
                }
            };
            predictions.push(prediction);
        }

        Ok(Self {
            labels,
            predictions,
            probabilities: probability_idx.map(|_| probabilities),
        })
    }
}

/// Parse a 0/1 label, accepting integer or float spelling
pub fn parse_label(raw: &str) -> Result<u8> {
    let value: f64 = raw
        .parse()
        .with_context(|| format!("label '{}' is not numeric", raw))?;
    if value == 0.0 {
        Ok(0)
    } else if value == 1.0 {
        Ok(1)
    } else {
        bail!("label {} is not 0 or 1", raw)
    }
}
