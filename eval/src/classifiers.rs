// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Classifiers compared by the evaluation pipeline
//!
//! Training is delegated to `linfa`; this module only adapts fitted models
//! to the `predict` / `predict_proba` contract the metrics consume.
//!
//! Implements:
//! - Logistic regression (`linfa-logistic`)
//! - Decision tree with Gini splits (`linfa-trees`)

use crate::datasets::TabularData;
use anyhow::{anyhow, bail, Result};
use linfa::traits::{Fit, Predict};
use linfa::DatasetBase;
use linfa_logistic::{FittedLogisticRegression, LogisticRegression};
use linfa_trees::DecisionTree;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Hard labels and positive-class probabilities for a batch of rows
#[derive(Debug, Clone, PartialEq)]
pub struct Predictions {
    pub labels: Vec<u8>,
    pub probabilities: Vec<f64>,
}

/// A binary classifier trained on tabular data
pub trait BinaryClassifier: Send + Sync {
    /// Train the model on the given split
    fn fit(&mut self, data: &TabularData) -> Result<()>;

    /// Predict 0/1 labels for each row
    fn predict(&self, features: &Array2<f64>) -> Result<Vec<u8>>;

    /// Predict the probability of label 1 for each row
    fn predict_proba(&self, features: &Array2<f64>) -> Result<Vec<f64>>;

    /// Labels and probabilities in one call
    fn predict_all(&self, features: &Array2<f64>) -> Result<Predictions> {
        Ok(Predictions {
            labels: self.predict(features)?,
            probabilities: self.predict_proba(features)?,
        })
    }

    /// Short identifier used on the command line
    fn id(&self) -> &str;

    /// Get model name
    fn name(&self) -> &str;

    /// Get model description
    fn description(&self) -> &str;
}

/// Hyperparameters handed to the classifier factory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierOptions {
    /// Maximum optimizer iterations for logistic regression
    pub max_iterations: u64,
    /// Maximum decision tree depth (`None` grows until leaves are pure)
    pub max_depth: Option<usize>,
}

impl Default for ClassifierOptions {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            max_depth: None,
        }
    }
}

fn to_linfa(data: &TabularData) -> DatasetBase<Array2<f64>, Array1<usize>> {
    let targets: Array1<usize> = data.labels.iter().map(|&l| usize::from(l)).collect();
    DatasetBase::from(data.features.clone()).with_targets(targets)
}

fn check_width(expected: usize, features: &Array2<f64>) -> Result<()> {
    if features.ncols() != expected {
        bail!(
            "model was fitted on {} features but got {}",
            expected,
            features.ncols()
        );
    }
    Ok(())
}

/// Logistic regression with L2 penalty
pub struct LogisticRegressionClassifier {
    max_iterations: u64,
    model: Option<FittedLogisticRegression<f64, usize>>,
    n_features: usize,
    /// linfa reports the probability of whichever class it picked as
    /// positive; true when that class is label 1
    label_one_is_positive: bool,
}

impl LogisticRegressionClassifier {
    pub fn new(max_iterations: u64) -> Self {
        Self {
            max_iterations,
            model: None,
            n_features: 0,
            label_one_is_positive: true,
        }
    }

    fn fitted(&self) -> Result<&FittedLogisticRegression<f64, usize>> {
        self.model
            .as_ref()
            .ok_or_else(|| anyhow!("{} has not been fitted", self.name()))
    }
}

impl Default for LogisticRegressionClassifier {
    fn default() -> Self {
        Self::new(ClassifierOptions::default().max_iterations)
    }
}

impl BinaryClassifier for LogisticRegressionClassifier {
    fn fit(&mut self, data: &TabularData) -> Result<()> {
        let dataset = to_linfa(data);
        let model = LogisticRegression::default()
            .max_iterations(self.max_iterations)
            .fit(&dataset)
            .map_err(|e| anyhow!("logistic regression fit failed: {}", e))?;

        // predict() thresholds the same probabilities at 0.5, so a single
        // disagreement with label 1 means the probabilities belong to label 0
        let probabilities = model.predict_probabilities(&data.features);
        let classes: Array1<usize> = model.predict(&data.features);
        self.label_one_is_positive = probabilities
            .iter()
            .zip(classes.iter())
            .all(|(&p, &c)| (p >= 0.5) == (c == 1));

        self.n_features = data.n_features();
        self.model = Some(model);
        Ok(())
    }

    fn predict(&self, features: &Array2<f64>) -> Result<Vec<u8>> {
        let model = self.fitted()?;
        check_width(self.n_features, features)?;
        let classes: Array1<usize> = model.predict(features);
        Ok(classes.iter().map(|&c| u8::from(c == 1)).collect())
    }

    fn predict_proba(&self, features: &Array2<f64>) -> Result<Vec<f64>> {
        let model = self.fitted()?;
        check_width(self.n_features, features)?;
        let probabilities = model.predict_probabilities(features);
        Ok(probabilities
            .iter()
            .map(|&p| if self.label_one_is_positive { p } else { 1.0 - p })
            .collect())
    }

    fn id(&self) -> &str {
        "lr"
    }

    fn name(&self) -> &str {
        "Logistic Regression"
    }

    fn description(&self) -> &str {
        "L2-regularised logistic regression fitted with L-BFGS"
    }
}

/// CART decision tree using Gini impurity
pub struct DecisionTreeClassifier {
    max_depth: Option<usize>,
    model: Option<DecisionTree<f64, usize>>,
    n_features: usize,
}

impl DecisionTreeClassifier {
    pub fn new(max_depth: Option<usize>) -> Self {
        Self {
            max_depth,
            model: None,
            n_features: 0,
        }
    }
}

impl Default for DecisionTreeClassifier {
    fn default() -> Self {
        Self::new(None)
    }
}

impl BinaryClassifier for DecisionTreeClassifier {
    fn fit(&mut self, data: &TabularData) -> Result<()> {
        if data.is_empty() {
            bail!("cannot fit {} on an empty split", self.name());
        }

        let dataset = to_linfa(data);
        let model = DecisionTree::params()
            .max_depth(self.max_depth)
            .fit(&dataset)
            .map_err(|e| anyhow!("decision tree fit failed: {}", e))?;

        self.n_features = data.n_features();
        self.model = Some(model);
        Ok(())
    }

    fn predict(&self, features: &Array2<f64>) -> Result<Vec<u8>> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| anyhow!("{} has not been fitted", self.name()))?;
        check_width(self.n_features, features)?;
        let classes: Array1<usize> = model.predict(features);
        Ok(classes.iter().map(|&c| u8::from(c == 1)).collect())
    }

    /// A leaf votes for a single class, so the probabilities are 0 or 1.
    /// For a tree grown until its leaves are pure this matches the class
    /// fractions of the leaf.
    fn predict_proba(&self, features: &Array2<f64>) -> Result<Vec<f64>> {
        Ok(self
            .predict(features)?
            .into_iter()
            .map(f64::from)
            .collect())
    }

    fn id(&self) -> &str {
        "dt"
    }

    fn name(&self) -> &str {
        "Decision Tree"
    }

    fn description(&self) -> &str {
        "CART decision tree with Gini impurity splits"
    }
}

/// Factory function to create every classifier the pipeline compares
pub fn all_classifiers(options: &ClassifierOptions) -> Vec<Box<dyn BinaryClassifier>> {
    vec![
        Box::new(LogisticRegressionClassifier::new(options.max_iterations)),
        Box::new(DecisionTreeClassifier::new(options.max_depth)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasets::Dataset;
    use crate::metrics::ConfusionMatrix;
    use crate::roc::roc_auc;
    use ndarray::array;

    fn toy_split() -> TabularData {
        TabularData {
            feature_names: vec!["x".to_string(), "y".to_string()],
            features: array![
                [0.0, 0.1],
                [0.2, 0.0],
                [0.1, 0.3],
                [0.3, 0.2],
                [3.0, 3.1],
                [3.2, 2.9],
                [2.9, 3.3],
                [3.1, 3.0]
            ],
            labels: vec![0, 0, 0, 0, 1, 1, 1, 1],
        }
    }

    #[test]
    fn test_unfitted_models_error() {
        let features = toy_split().features;
        assert!(LogisticRegressionClassifier::default().predict(&features).is_err());
        assert!(DecisionTreeClassifier::default().predict_proba(&features).is_err());
    }

    #[test]
    fn test_decision_tree_separable() {
        let data = toy_split();
        let mut model = DecisionTreeClassifier::default();
        model.fit(&data).unwrap();

        let predictions = model.predict_all(&data.features).unwrap();
        assert_eq!(predictions.labels, data.labels);
        assert!(predictions
            .probabilities
            .iter()
            .all(|&p| p == 0.0 || p == 1.0));
    }

    #[test]
    fn test_logistic_regression_probability_orientation() {
        let data = toy_split();
        let mut model = LogisticRegressionClassifier::default();
        model.fit(&data).unwrap();

        let probabilities = model.predict_proba(&data.features).unwrap();
        assert!(probabilities.iter().all(|p| (0.0..=1.0).contains(p)));
        // Rows labelled 1 must receive the higher probabilities
        assert!((roc_auc(&probabilities, &data.labels).unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_feature_width_checked() {
        let data = toy_split();
        let mut model = DecisionTreeClassifier::default();
        model.fit(&data).unwrap();

        let narrow = Array2::<f64>::zeros((2, 1));
        assert!(model.predict(&narrow).is_err());
    }

    #[test]
    fn test_classifiers_on_synthetic_data() {
        let dataset = Dataset::load_synthetic(600, 0.4, 42).unwrap();

        for mut model in all_classifiers(&ClassifierOptions::default()) {
            model.fit(&dataset.train).unwrap();
            let predictions = model.predict_all(&dataset.test.features).unwrap();

            assert_eq!(predictions.labels.len(), dataset.test.len());
            assert_eq!(predictions.probabilities.len(), dataset.test.len());

            let cm = ConfusionMatrix::from_predictions(&predictions.labels, &dataset.test.labels).unwrap();
            assert!(cm.accuracy() > 0.6, "{} accuracy {}", model.name(), cm.accuracy());
        }
    }

    #[test]
    fn test_all_classifiers() {
        let classifiers = all_classifiers(&ClassifierOptions::default());
        assert_eq!(classifiers.len(), 2);

        let ids: Vec<_> = classifiers.iter().map(|c| c.id()).collect();
        assert_eq!(ids, vec!["lr", "dt"]);
    }
}
