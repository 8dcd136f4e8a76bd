//! Training service: Fits, evaluates and persists the classifier.
//!
//! This service coordinates:
//! - Synthetic data generation
//! - Stratified train/test split
//! - Random forest fitting
//! - Held-out evaluation
//! - Artifact persistence
//!
//! Accuracy is reported, never gated: a poor model is still persisted.

use std::sync::Arc;

use crate::adapters::forest::{ModelArtifact, RandomForest};
use crate::adapters::synthetic::SyntheticGenerator;
use crate::config::TrainingConfig;
use crate::domain::{ClassificationReport, Feature, TrainingSet};
use crate::ports::{ArtifactStore, Classifier};
use crate::{GlucosenseError, Result};

/// Everything a training run produced.
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    /// The persisted artifact
    pub artifact: ModelArtifact,

    /// Held-out accuracy (0.0 when the test partition is empty)
    pub accuracy: f64,

    /// Per-class metrics on the test partition
    pub report: ClassificationReport,

    /// Normalised feature importances, in schema order
    pub feature_importances: Vec<(Feature, f64)>,

    pub train_size: usize,
    pub test_size: usize,
}

/// Service for training and persisting the model.
pub struct TrainingService<S>
where
    S: ArtifactStore,
{
    store: Arc<S>,
    config: TrainingConfig,
}

impl<S> TrainingService<S>
where
    S: ArtifactStore,
    S::Error: Into<crate::adapters::StorageError>,
{
    /// Create a new training service.
    pub fn new(store: Arc<S>, config: TrainingConfig) -> Self {
        Self { store, config }
    }

    #[must_use]
    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Generate data from the configured seed, then train on it.
    ///
    /// # Errors
    /// Returns error if generation, fitting or persistence fails.
    pub fn run(&self) -> Result<TrainingOutcome> {
        self.config.validate()?;
        let generator = SyntheticGenerator::with_params(self.config.generator.clone());
        let data = generator.generate(self.config.n_samples, self.config.seed)?;
        self.train(&data)
    }

    /// Fit on an 80/20 stratified split of `data`, evaluate and persist.
    ///
    /// # Errors
    /// Returns `Training` if an outcome is not 0 or 1, and an error if
    /// fitting or persistence fails. Nothing is written on error.
    pub fn train(&self, data: &TrainingSet) -> Result<TrainingOutcome> {
        let classes = data.classes();
        if let Some(c) = classes.iter().find(|&&c| c > 1) {
            return Err(GlucosenseError::Training(format!(
                "outcome {c} is not binary; training labels must be 0 or 1"
            )));
        }
        if classes.len() < 2 {
            tracing::warn!(
                "Training set has a single outcome class {:?}; the model will only predict it",
                classes
            );
        }

        let (train, test) = data.stratified_split(self.config.test_fraction, self.config.split_seed);
        if train.is_empty() {
            return Err(GlucosenseError::Training(format!(
                "train partition is empty ({} samples, test_fraction={})",
                data.len(),
                self.config.test_fraction
            )));
        }

        tracing::info!(
            "Training random forest: {} train / {} test samples, {} trees",
            train.len(),
            test.len(),
            self.config.forest.n_estimators
        );
        let forest = RandomForest::fit(&self.config.forest, &train)?;

        let (accuracy, report) = Self::evaluate(&forest, &test)?;
        if test.is_empty() {
            tracing::warn!("Test partition is empty; accuracy reported as 0");
        }
        tracing::info!("Model accuracy: {accuracy:.3}");

        let feature_importances: Vec<(Feature, f64)> = Feature::ALL
            .iter()
            .copied()
            .zip(forest.feature_importances())
            .collect();
        for (feature, importance) in &feature_importances {
            tracing::debug!("Feature importance {feature}: {importance:.4}");
        }

        let artifact = ModelArtifact::new(forest, Some(accuracy));
        let bytes = artifact.encode()?;
        self.store
            .write(&bytes)
            .map_err(|e| GlucosenseError::Storage(e.into()))?;
        tracing::info!(
            "Model saved to {} ({} bytes)",
            self.store.location(),
            bytes.len()
        );

        Ok(TrainingOutcome {
            artifact,
            accuracy,
            report,
            feature_importances,
            train_size: train.len(),
            test_size: test.len(),
        })
    }

    fn evaluate<C: Classifier>(
        model: &C,
        test: &TrainingSet,
    ) -> Result<(f64, ClassificationReport)> {
        let y_true = test.labels();
        let y_pred = test
            .samples()
            .iter()
            .map(|s| model.predict(&s.features.to_vec()))
            .collect::<std::result::Result<Vec<u8>, _>>()
            .map_err(GlucosenseError::PredictionFailed)?;

        let report = ClassificationReport::from_predictions(&y_true, &y_pred);
        Ok((report.accuracy, report))
    }
}
