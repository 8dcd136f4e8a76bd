//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the application and the classifier implementation and the
//! durable artifact storage.

mod artifact_store;
mod classifier;

pub use artifact_store::ArtifactStore;
pub use classifier::{ClassProbabilities, Classifier, ClassifierError};
