//! Storage adapters: Implementations of ArtifactStore.
//!
//! - [`FileArtifactStore`] keeps the model at a fixed, well-known path and
//!   replaces it atomically (write to a uniquely named sibling temp file,
//!   then rename over the target).
//! - [`MemoryArtifactStore`] keeps the bytes in process memory and counts
//!   reads, for tests.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use tempfile::NamedTempFile;

use crate::ports::ArtifactStore;

/// Well-known artifact location relative to the working directory.
pub const DEFAULT_ARTIFACT_PATH: &str = "models/diabetes_model.bin";

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Storage lock poisoned")]
    Poisoned,
}

/// File-backed artifact store.
#[derive(Debug, Clone)]
pub struct FileArtifactStore {
    path: PathBuf,
}

impl FileArtifactStore {
    /// Store the artifact at `path`.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }

    fn parent_dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}

impl Default for FileArtifactStore {
    fn default() -> Self {
        Self::new(DEFAULT_ARTIFACT_PATH)
    }
}

impl ArtifactStore for FileArtifactStore {
    type Error = StorageError;

    fn write(&self, bytes: &[u8]) -> Result<(), Self::Error> {
        let parent = self.parent_dir();
        fs::create_dir_all(&parent).map_err(|e| self.io_err(e))?;

        // Unique sibling temp file; concurrent writers never share it.
        let mut tmp = NamedTempFile::new_in(&parent).map_err(|e| self.io_err(e))?;
        tmp.write_all(bytes).map_err(|e| self.io_err(e))?;
        tmp.as_file().sync_all().map_err(|e| self.io_err(e))?;
        tmp.persist(&self.path).map_err(|e| self.io_err(e.error))?;

        tracing::debug!("Wrote {} bytes to {:?}", bytes.len(), self.path);
        Ok(())
    }

    fn read(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_err(e)),
        }
    }

    fn exists(&self) -> Result<bool, Self::Error> {
        Ok(self.path.is_file())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-memory artifact store.
#[derive(Debug, Default)]
pub struct MemoryArtifactStore {
    bytes: RwLock<Option<Vec<u8>>>,
    reads: AtomicUsize,
}

impl MemoryArtifactStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `bytes`.
    #[must_use]
    pub fn with_bytes(bytes: Vec<u8>) -> Self {
        Self {
            bytes: RwLock::new(Some(bytes)),
            reads: AtomicUsize::new(0),
        }
    }

    /// Number of `read` calls served so far.
    #[must_use]
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl ArtifactStore for MemoryArtifactStore {
    type Error = StorageError;

    fn write(&self, bytes: &[u8]) -> Result<(), Self::Error> {
        let mut slot = self.bytes.write().map_err(|_| StorageError::Poisoned)?;
        *slot = Some(bytes.to_vec());
        Ok(())
    }

    fn read(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let slot = self.bytes.read().map_err(|_| StorageError::Poisoned)?;
        Ok(slot.clone())
    }

    fn exists(&self) -> Result<bool, Self::Error> {
        let slot = self.bytes.read().map_err(|_| StorageError::Poisoned)?;
        Ok(slot.is_some())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_file_store_write_read() {
        let temp = tempdir().expect("tempdir");
        let store = FileArtifactStore::new(temp.path().join("nested/dir/model.bin"));

        assert!(!store.exists().expect("exists"));
        assert_eq!(store.read().expect("read"), None);

        store.write(b"first").expect("write");
        store.write(b"second").expect("overwrite");

        assert!(store.exists().expect("exists"));
        assert_eq!(store.read().expect("read"), Some(b"second".to_vec()));

        let leftovers: Vec<_> = fs::read_dir(temp.path().join("nested/dir"))
            .expect("read_dir")
            .collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[test]
    fn test_concurrent_writers_do_not_clobber_each_other() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("model.bin");
        let payloads: Vec<Vec<u8>> = (0..8u8).map(|i| vec![i; 64 * 1024]).collect();

        std::thread::scope(|scope| {
            for payload in &payloads {
                let store = FileArtifactStore::new(&path);
                scope.spawn(move || store.write(payload).expect("write"));
            }
        });

        let stored = FileArtifactStore::new(&path)
            .read()
            .expect("read")
            .expect("artifact written");
        assert!(payloads.contains(&stored));

        let entries = fs::read_dir(temp.path()).expect("read_dir").count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_default_location() {
        let store = FileArtifactStore::default();
        assert_eq!(store.path(), Path::new(DEFAULT_ARTIFACT_PATH));
    }

    #[test]
    fn test_memory_store_counts_reads() {
        let store = MemoryArtifactStore::new();
        assert!(!store.exists().expect("exists"));

        store.write(&[1, 2, 3]).expect("write");
        assert_eq!(store.read().expect("read"), Some(vec![1, 2, 3]));
        assert_eq!(store.read_count(), 1);
        assert_eq!(store.location(), "memory");
    }
}
