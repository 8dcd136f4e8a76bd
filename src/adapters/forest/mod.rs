//! Forest adapter: Implementation of Classifier using a random forest.
//!
//! A bagged ensemble of CART trees. Each tree is grown on a bootstrap
//! sample of the training rows and considers a random subset of features at
//! every split. Class probabilities are the mean of the per-tree leaf
//! distributions.
//!
//! # Determinism
//!
//! Trees are grown in parallel with rayon. Every tree owns a `ChaCha8Rng`
//! seeded from [`ForestParams::seed`] with the tree index as stream id, so
//! the fitted forest does not depend on thread scheduling.

mod artifact;
mod tree;

pub use artifact::{ArtifactError, ModelArtifact, ARTIFACT_FORMAT_VERSION};
pub use tree::DecisionTree;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::TrainingSet;
use crate::ports::{ClassProbabilities, Classifier, ClassifierError};
use crate::{GlucosenseError, Result};

use tree::TreeParams;

/// Hyperparameters of the random forest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    /// Number of trees
    pub n_estimators: usize,

    /// Maximum depth of each tree (root is depth 0)
    pub max_depth: usize,

    /// Minimum samples required to split an internal node
    pub min_samples_split: usize,

    /// Minimum samples required in each leaf
    pub min_samples_leaf: usize,

    /// Features considered per split; `None` means floor(sqrt(n_features))
    pub max_features: Option<usize>,

    /// Draw a bootstrap sample per tree
    pub bootstrap: bool,

    /// Base seed for tree randomness
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: 10,
            min_samples_split: 5,
            min_samples_leaf: 2,
            max_features: None,
            bootstrap: true,
            seed: 42,
        }
    }
}

impl ForestParams {
    /// Load overrides from environment (best-effort).
    ///
    /// Supported:
    /// - GLUCOSENSE_N_ESTIMATORS
    /// - GLUCOSENSE_MAX_DEPTH
    /// - GLUCOSENSE_FOREST_SEED
    #[must_use]
    pub fn from_env_or_default() -> Self {
        let mut params = Self::default();

        if let Some(v) = crate::config::env_parse::<usize>("GLUCOSENSE_N_ESTIMATORS") {
            if v > 0 {
                params.n_estimators = v;
            }
        }
        if let Some(v) = crate::config::env_parse::<usize>("GLUCOSENSE_MAX_DEPTH") {
            if v > 0 {
                params.max_depth = v;
            }
        }
        if let Some(v) = crate::config::env_parse::<u64>("GLUCOSENSE_FOREST_SEED") {
            params.seed = v;
        }

        params
    }

    fn tree_params(&self, n_features: usize) -> TreeParams {
        let default_max = ((n_features as f64).sqrt().floor() as usize).max(1);
        TreeParams {
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            min_samples_leaf: self.min_samples_leaf,
            max_features: self
                .max_features
                .unwrap_or(default_max)
                .clamp(1, n_features.max(1)),
        }
    }
}

/// A fitted random forest classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    classes: Vec<u8>,
    n_features: usize,
}

impl RandomForest {
    /// Fit a forest on a training set.
    ///
    /// A set containing a single outcome class yields a forest that always
    /// predicts that class with probability 1.
    ///
    /// # Errors
    /// Returns `Training` if the set is empty or the parameters are unusable.
    pub fn fit(params: &ForestParams, data: &TrainingSet) -> Result<Self> {
        if data.is_empty() {
            return Err(GlucosenseError::Training(
                "cannot fit on an empty training set".into(),
            ));
        }
        if params.n_estimators == 0 {
            return Err(GlucosenseError::Training(
                "n_estimators must be positive".into(),
            ));
        }

        let x = data.feature_matrix();
        let classes = data.classes();
        let y: Vec<usize> = data
            .labels()
            .iter()
            .map(|label| classes.iter().position(|c| c == label).unwrap_or(0))
            .collect();

        let n = x.len();
        let n_features = x[0].len();
        let tree_params = params.tree_params(n_features);

        tracing::debug!(
            "Fitting {} trees on {} samples (max_depth={}, max_features={})",
            params.n_estimators,
            n,
            tree_params.max_depth,
            tree_params.max_features
        );

        let trees: Vec<DecisionTree> = (0..params.n_estimators)
            .into_par_iter()
            .map(|t| {
                let mut rng = ChaCha8Rng::seed_from_u64(params.seed);
                rng.set_stream(t as u64);

                let indices: Vec<usize> = if params.bootstrap {
                    (0..n).map(|_| rng.gen_range(0..n)).collect()
                } else {
                    (0..n).collect()
                };

                DecisionTree::fit(&x, &y, classes.len(), indices, tree_params, &mut rng)
            })
            .collect();

        Ok(Self {
            trees,
            classes,
            n_features,
        })
    }

    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    #[must_use]
    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    /// Mean impurity-based feature importances, normalised to sum to one.
    #[must_use]
    pub fn feature_importances(&self) -> Vec<f64> {
        let mut total = vec![0.0; self.n_features];
        for tree in &self.trees {
            for (acc, v) in total.iter_mut().zip(tree.normalized_importances()) {
                *acc += v;
            }
        }
        let sum: f64 = total.iter().sum();
        if sum > 0.0 {
            total.iter_mut().for_each(|v| *v /= sum);
        }
        total
    }

    /// Structural sanity check used after deserialization.
    pub(crate) fn validate(&self) -> std::result::Result<(), String> {
        if self.trees.is_empty() {
            return Err("forest has no trees".into());
        }
        if self.classes.is_empty() {
            return Err("forest has no classes".into());
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(self.classes.len())
                .map_err(|e| format!("tree {i}: {e}"))?;
        }
        Ok(())
    }
}

impl Classifier for RandomForest {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn classes(&self) -> &[u8] {
        &self.classes
    }

    fn predict_proba(&self, x: &[f64]) -> std::result::Result<ClassProbabilities, ClassifierError> {
        if x.len() != self.n_features {
            return Err(ClassifierError::ShapeMismatch {
                got: x.len(),
                expected: self.n_features,
            });
        }
        if self.trees.is_empty() {
            return Err(ClassifierError::NotFitted);
        }

        let mut probabilities = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            let leaf = tree.leaf_proba(x);
            if leaf.len() != probabilities.len() {
                return Err(ClassifierError::Malformed(format!(
                    "leaf has {} classes, expected {}",
                    leaf.len(),
                    probabilities.len()
                )));
            }
            for (acc, p) in probabilities.iter_mut().zip(leaf) {
                *acc += p;
            }
        }
        let n_trees = self.trees.len() as f64;
        probabilities.iter_mut().for_each(|p| *p /= n_trees);

        Ok(ClassProbabilities {
            classes: self.classes.clone(),
            probabilities,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::synthetic::SyntheticGenerator;
    use crate::domain::{FeatureRecord, TrainingSample};

    fn small_params() -> ForestParams {
        ForestParams {
            n_estimators: 15,
            ..ForestParams::default()
        }
    }

    #[test]
    fn test_default_params() {
        let p = ForestParams::default();
        assert_eq!(p.n_estimators, 100);
        assert_eq!(p.max_depth, 10);
        assert_eq!(p.min_samples_split, 5);
        assert_eq!(p.min_samples_leaf, 2);
        assert_eq!(p.tree_params(8).max_features, 2);
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let data = SyntheticGenerator::new().generate(400, 42).expect("generate");
        let forest = RandomForest::fit(&small_params(), &data).expect("fit");
        assert_eq!(forest.n_trees(), 15);
        assert_eq!(forest.classes(), &[0, 1]);

        for sample in data.samples().iter().take(50) {
            let dist = forest
                .predict_proba(&sample.features.to_vec())
                .expect("predict");
            let sum: f64 = dist.probabilities.iter().sum();
            assert!((sum - 1.0).abs() < 1e-9);
            assert!(dist.probabilities.iter().all(|p| (0.0..=1.0).contains(p)));

            let label = forest.predict(&sample.features.to_vec()).expect("predict");
            assert_eq!(Some(label), dist.argmax());
        }
    }

    #[test]
    fn test_fit_is_deterministic() {
        let data = SyntheticGenerator::new().generate(300, 5).expect("generate");
        let a = RandomForest::fit(&small_params(), &data).expect("fit");
        let b = RandomForest::fit(&small_params(), &data).expect("fit");
        assert_eq!(a, b);
    }

    #[test]
    fn test_shape_mismatch() {
        let data = SyntheticGenerator::new().generate(100, 1).expect("generate");
        let forest = RandomForest::fit(&small_params(), &data).expect("fit");
        let err = forest.predict_proba(&[1.0, 2.0]).expect_err("must fail");
        assert_eq!(err, ClassifierError::ShapeMismatch { got: 2, expected: 8 });
    }

    #[test]
    fn test_single_class_forest() {
        let data: TrainingSet = (0..20)
            .map(|i| TrainingSample {
                features: FeatureRecord {
                    glucose: 80.0 + i as f64,
                    ..Default::default()
                },
                outcome: 0,
            })
            .collect();
        let forest = RandomForest::fit(&small_params(), &data).expect("fit");

        let dist = forest
            .predict_proba(&FeatureRecord::default().to_vec())
            .expect("predict");
        assert_eq!(dist.classes, vec![0]);
        assert_eq!(dist.probabilities, vec![1.0]);
    }

    #[test]
    fn test_feature_importances_normalised() {
        let data = SyntheticGenerator::new().generate(400, 42).expect("generate");
        let forest = RandomForest::fit(&small_params(), &data).expect("fit");
        let imp = forest.feature_importances();
        assert_eq!(imp.len(), 8);
        assert!(imp.iter().all(|v| *v >= 0.0));
        assert!((imp.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_set_rejected() {
        let err = RandomForest::fit(&small_params(), &TrainingSet::default()).expect_err("fail");
        assert!(matches!(err, GlucosenseError::Training(_)));
    }
}
