//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with ports to implement
//! the core use cases of the application.

mod inference;
mod model_store;
mod training;

pub use inference::{Assessment, InferenceService};
pub use model_store::ModelStore;
pub use training::{TrainingOutcome, TrainingService};
