//! # Glucosense
//!
//! Diabetes risk estimation from eight clinical measurements.
//!
//! This crate provides:
//! - A seeded synthetic data generator for labeled training data
//! - Random forest training, evaluation and artifact persistence
//! - A process-wide cached model store and an inference service
//! - Rule-based risk factor flags and per-metric status bands that run
//!   independently of the model
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core business types (FeatureRecord, Prediction, risk rules)
//! - `ports`: Trait definitions for the classifier and artifact storage
//! - `adapters`: Concrete implementations (generator, random forest, stores)
//! - `application`: Use cases orchestrating domain and ports
//!
//! ## Feature order
//!
//! The classifier consumes bare vectors. [`domain::Feature::ALL`] is the
//! single definition of their order and persisted artifacts record it, so a
//! model trained on a different layout is refused at load time.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod logging;
pub mod ports;

pub use domain::{FeatureRecord, Gender, Prediction, RiskProfile, StatusReport};

/// Result type for Glucosense operations
pub type Result<T> = std::result::Result<T, GlucosenseError>;

/// Main error type for Glucosense
#[derive(Debug, thiserror::Error)]
pub enum GlucosenseError {
    #[error("Model artifact unavailable: {0}")]
    ArtifactUnavailable(String),

    #[error("Prediction failed: {0}")]
    PredictionFailed(#[source] ports::ClassifierError),

    #[error("Invalid generation request: {0}")]
    InvalidGenerationRequest(String),

    #[error("Training failed: {0}")]
    Training(String),

    #[error("Artifact encoding failed: {0}")]
    Artifact(#[from] adapters::forest::ArtifactError),

    #[error("Storage operation failed: {0}")]
    Storage(#[from] adapters::StorageError),

    #[error("Invalid configuration: {0}")]
    Config(String),
}
