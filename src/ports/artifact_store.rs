//! Artifact store port: Trait for durable model storage.
//!
//! The store deals in opaque bytes. Encoding and integrity checks belong to
//! the model codec, so any backend can hold any artifact format.

/// Trait for persisting the trained model blob under a fixed identifier.
pub trait ArtifactStore: Send + Sync {
    /// Error type for storage operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Replace the stored artifact.
    ///
    /// # Errors
    /// Returns error if the write fails.
    fn write(&self, bytes: &[u8]) -> Result<(), Self::Error>;

    /// Read the stored artifact.
    ///
    /// # Returns
    /// `None` if no artifact has been written.
    ///
    /// # Errors
    /// Returns error if the read fails.
    fn read(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Check whether an artifact exists.
    ///
    /// # Errors
    /// Returns error if the backend cannot be queried.
    fn exists(&self) -> Result<bool, Self::Error>;

    /// Human-readable location, used in logs and error messages.
    fn location(&self) -> String;
}
