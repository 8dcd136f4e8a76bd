//! Inference service: Scores feature records with the trained classifier.
//!
//! Inputs are passed to the classifier as given. Range checks are the
//! caller's job (see [`FeatureRecord::validate`]); out-of-range values are
//! scored anyway and may extrapolate poorly.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::{
    analyze, FeatureRecord, Gender, Prediction, RiskLevel, RiskProfile, StatusReport,
};
use crate::ports::{ArtifactStore, Classifier, ClassifierError};
use crate::{GlucosenseError, Result};

use super::ModelStore;

/// Model output plus the model-independent explanations for one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub prediction: Prediction,
    pub verdict: String,
    pub risk_level: RiskLevel,
    pub risk_factors: RiskProfile,
    pub status: StatusReport,
}

/// Service for running model inference.
pub struct InferenceService<C>
where
    C: Classifier,
{
    model: Arc<C>,
}

impl<C> Clone for InferenceService<C>
where
    C: Classifier,
{
    fn clone(&self) -> Self {
        Self {
            model: Arc::clone(&self.model),
        }
    }
}

impl<C> InferenceService<C>
where
    C: Classifier,
{
    /// Create a new inference service around a shared model.
    pub fn new(model: Arc<C>) -> Self {
        Self { model }
    }

    /// Predict the outcome and positive-class probability for a record.
    ///
    /// # Errors
    /// Returns `PredictionFailed` carrying the classifier's error if scoring
    /// fails. No default prediction is substituted.
    pub fn predict(&self, record: &FeatureRecord) -> Result<Prediction> {
        let x = record.to_array();
        let rejected = |e: ClassifierError| {
            tracing::error!("Classifier rejected input vector: {e}");
            GlucosenseError::PredictionFailed(e)
        };

        let label = self.model.predict(&x).map_err(rejected)?;
        let dist = self.model.predict_proba(&x).map_err(rejected)?;

        let prediction = Prediction::from_distribution(&dist.classes, &dist.probabilities)
            .map_err(|e| rejected(ClassifierError::Malformed(e)))?;
        if prediction.label != label {
            return Err(rejected(ClassifierError::Malformed(format!(
                "predicted class {label} disagrees with distribution argmax {}",
                prediction.label
            ))));
        }

        tracing::debug!(
            "Prediction: label={}, risk_score={:.3}",
            prediction.label,
            prediction.risk_score
        );

        Ok(prediction)
    }

    /// Predict and attach risk factors and status bands.
    ///
    /// # Errors
    /// Returns error if prediction fails.
    pub fn assess(&self, record: &FeatureRecord, gender: Gender) -> Result<Assessment> {
        let prediction = self.predict(record)?;

        Ok(Assessment {
            verdict: prediction.verdict().to_string(),
            risk_level: prediction.risk_level(),
            prediction,
            risk_factors: analyze(record, gender),
            status: StatusReport::for_record(record),
        })
    }
}

impl InferenceService<crate::adapters::forest::ModelArtifact> {
    /// Build a service from the cached model.
    ///
    /// # Errors
    /// Returns `ArtifactUnavailable` if the model cannot be loaded.
    pub fn from_store<S: ArtifactStore>(store: &ModelStore<S>) -> Result<Self> {
        Ok(Self::new(store.get()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::forest::ForestParams;
    use crate::adapters::storage::FileArtifactStore;
    use crate::application::TrainingService;
    use crate::config::TrainingConfig;
    use crate::domain::{Band, Metric, RiskFactor};
    use crate::ports::ClassProbabilities;
    use tempfile::tempdir;

    /// Classifier stub returning a fixed distribution.
    struct FixedClassifier {
        classes: Vec<u8>,
        probabilities: Vec<f64>,
    }

    impl Classifier for FixedClassifier {
        fn n_features(&self) -> usize {
            8
        }

        fn classes(&self) -> &[u8] {
            &self.classes
        }

        fn predict_proba(
            &self,
            x: &[f64],
        ) -> std::result::Result<ClassProbabilities, ClassifierError> {
            if x.len() != 8 {
                return Err(ClassifierError::ShapeMismatch {
                    got: x.len(),
                    expected: 8,
                });
            }
            Ok(ClassProbabilities {
                classes: self.classes.clone(),
                probabilities: self.probabilities.clone(),
            })
        }
    }

    /// Classifier stub expecting a different feature layout.
    struct WrongShapeClassifier;

    impl Classifier for WrongShapeClassifier {
        fn n_features(&self) -> usize {
            9
        }

        fn classes(&self) -> &[u8] {
            &[0, 1]
        }

        fn predict_proba(
            &self,
            x: &[f64],
        ) -> std::result::Result<ClassProbabilities, ClassifierError> {
            Err(ClassifierError::ShapeMismatch {
                got: x.len(),
                expected: 9,
            })
        }
    }

    /// Classifier stub that was never fitted: it knows no classes.
    struct EmptyClassifier;

    impl Classifier for EmptyClassifier {
        fn n_features(&self) -> usize {
            8
        }

        fn classes(&self) -> &[u8] {
            &[]
        }

        fn predict_proba(
            &self,
            _x: &[f64],
        ) -> std::result::Result<ClassProbabilities, ClassifierError> {
            Ok(ClassProbabilities {
                classes: Vec::new(),
                probabilities: Vec::new(),
            })
        }
    }

    fn canonical_record() -> FeatureRecord {
        FeatureRecord {
            pregnancies: 2,
            glucose: 130.0,
            blood_pressure: 95.0,
            skin_thickness: 20.0,
            insulin: 85.0,
            bmi: 32.0,
            pedigree_score: 0.6,
            age: 50.0,
        }
    }

    #[test]
    fn test_positive_class_probability_is_risk_score() {
        let service = InferenceService::new(Arc::new(FixedClassifier {
            classes: vec![0, 1],
            probabilities: vec![0.3, 0.7],
        }));
        let prediction = service.predict(&canonical_record()).expect("predict");
        assert_eq!(prediction.label, 1);
        assert!((prediction.risk_score - 0.7).abs() < f64::EPSILON);
    }

    #[test]
    fn test_single_class_fallback() {
        let service = InferenceService::new(Arc::new(FixedClassifier {
            classes: vec![0],
            probabilities: vec![1.0],
        }));
        let prediction = service.predict(&canonical_record()).expect("predict");
        assert_eq!(prediction.label, 0);
        assert!((prediction.risk_score - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_classifier_failure_is_surfaced() {
        let service = InferenceService::new(Arc::new(WrongShapeClassifier));
        let err = service.predict(&canonical_record()).expect_err("must fail");
        match err {
            GlucosenseError::PredictionFailed(cause) => {
                assert_eq!(cause, ClassifierError::ShapeMismatch { got: 8, expected: 9 });
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_empty_distribution_is_not_a_prediction() {
        let service = InferenceService::new(Arc::new(EmptyClassifier));
        let err = service.predict(&canonical_record()).expect_err("must fail");
        assert!(matches!(
            err,
            GlucosenseError::PredictionFailed(ClassifierError::NotFitted)
        ));
    }

    #[test]
    fn test_malformed_distributions_are_rejected() {
        let cases = [
            (vec![0, 1], vec![0.4]),
            (vec![0, 0], vec![0.4, 0.6]),
            (vec![0, 2], vec![0.3, 0.7]),
        ];
        for (classes, probabilities) in cases {
            let service = InferenceService::new(Arc::new(FixedClassifier {
                classes,
                probabilities,
            }));
            let err = service.predict(&canonical_record()).expect_err("must fail");
            assert!(matches!(err, GlucosenseError::PredictionFailed(_)), "{err:?}");
        }
    }

    #[test]
    fn test_out_of_range_input_is_scored() {
        let service = InferenceService::new(Arc::new(FixedClassifier {
            classes: vec![0, 1],
            probabilities: vec![0.9, 0.1],
        }));
        let record = FeatureRecord {
            glucose: 5000.0,
            age: -3.0,
            ..canonical_record()
        };
        assert!(service.predict(&record).is_ok());
    }

    #[test]
    fn test_assess_combines_model_and_rules() {
        let service = InferenceService::new(Arc::new(FixedClassifier {
            classes: vec![0, 1],
            probabilities: vec![0.6, 0.4],
        }));
        let assessment = service
            .assess(&canonical_record(), Gender::Female)
            .expect("assess");

        assert_eq!(assessment.verdict, "Not Diabetic");
        assert_eq!(assessment.risk_level, RiskLevel::Moderate);
        assert_eq!(assessment.risk_factors.len(), 6);
        assert!(assessment.risk_factors.contains(RiskFactor::GestationalRiskFactor));
        assert_eq!(assessment.status.band(Metric::Glucose), Some(Band::High));
    }

    #[test]
    fn test_end_to_end_train_store_predict() {
        let temp = tempdir().expect("tempdir");
        let backend = Arc::new(FileArtifactStore::new(temp.path().join("model.bin")));

        let config = TrainingConfig {
            forest: ForestParams {
                n_estimators: 25,
                ..ForestParams::default()
            },
            ..TrainingConfig::default()
        };
        TrainingService::new(backend.clone(), config)
            .run()
            .expect("train");

        let store = ModelStore::new(backend);
        let service = InferenceService::from_store(&store).expect("load");

        let records = [
            canonical_record(),
            FeatureRecord {
                pregnancies: 0,
                glucose: 90.0,
                blood_pressure: 70.0,
                skin_thickness: 20.0,
                insulin: 80.0,
                bmi: 22.0,
                pedigree_score: 0.1,
                age: 25.0,
            },
        ];
        for record in &records {
            let prediction = service.predict(record).expect("predict");
            assert!(prediction.label <= 1);
            assert!((0.0..=1.0).contains(&prediction.risk_score));

            let dist = store
                .get()
                .expect("cached")
                .predict_proba(&record.to_vec())
                .expect("proba");
            let sum: f64 = dist.probabilities.iter().sum();
            assert!((sum - 1.0).abs() < 1e-9);
            assert_eq!(Some(prediction.label), dist.argmax());
        }
    }
}
