//! Domain layer: Core business types and logic.
//!
//! This module contains the feature schema, training data, prediction
//! results and the rule-based explanation functions. Nothing here performs
//! I/O or depends on the trained model.

mod dataset;
mod evaluation;
mod features;
mod prediction;
mod risk;
mod status;

pub use dataset::{TrainingSample, TrainingSet};
pub use evaluation::{accuracy, AverageMetrics, ClassMetrics, ClassificationReport};
pub use features::{Feature, FeatureRecord, Gender, FEATURE_COUNT, FEATURE_NAMES};
pub use prediction::{Prediction, RiskLevel};
pub use risk::{analyze, RiskFactor, RiskProfile};
pub use status::{status, Band, Metric, MetricStatus, StatusReport};
