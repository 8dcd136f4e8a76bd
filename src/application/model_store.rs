//! Model store: Lazily loaded, process-lifetime model handle.
//!
//! The first successful [`ModelStore::get`] reads and verifies the artifact;
//! every later call returns the same `Arc` without touching storage.
//! Concurrent first calls are serialised by `OnceCell`, so the artifact is
//! decoded exactly once. A failed load is not cached.

use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::adapters::forest::ModelArtifact;
use crate::ports::ArtifactStore;
use crate::{GlucosenseError, Result};

/// Shared, immutable handle to the persisted model.
pub struct ModelStore<S>
where
    S: ArtifactStore,
{
    store: Arc<S>,
    model: OnceCell<Arc<ModelArtifact>>,
}

impl<S> ModelStore<S>
where
    S: ArtifactStore,
{
    /// Create a store that will load from `store` on first access.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            model: OnceCell::new(),
        }
    }

    /// Get the cached model, loading it on first access.
    ///
    /// # Errors
    /// Returns `ArtifactUnavailable` if the artifact is missing, unreadable
    /// or fails verification. Callers must not retry within a request.
    pub fn get(&self) -> Result<Arc<ModelArtifact>> {
        self.model.get_or_try_init(|| self.load()).cloned()
    }

    /// Whether the model has been loaded.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.model.get().is_some()
    }

    fn load(&self) -> Result<Arc<ModelArtifact>> {
        let location = self.store.location();
        tracing::info!("Loading model artifact from {location}");

        let bytes = self
            .store
            .read()
            .map_err(|e| {
                GlucosenseError::ArtifactUnavailable(format!("failed to read {location}: {e}"))
            })?
            .ok_or_else(|| {
                GlucosenseError::ArtifactUnavailable(format!("no model found at {location}"))
            })?;

        let artifact = ModelArtifact::decode(&bytes).map_err(|e| {
            tracing::error!("Rejecting model artifact at {location}: {e}");
            GlucosenseError::ArtifactUnavailable(format!("{location}: {e}"))
        })?;

        tracing::info!(
            "Loaded model ({} trees, created {}, accuracy {})",
            artifact.forest.n_trees(),
            artifact.created_at.to_rfc3339(),
            artifact
                .accuracy
                .map_or_else(|| "n/a".to_string(), |a| format!("{a:.3}"))
        );

        Ok(Arc::new(artifact))
    }
}
