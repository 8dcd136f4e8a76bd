//! Persistable model artifact.
//!
//! On-disk layout is a bincode envelope `{ magic, format_version,
//! sha256_hex, payload }` where `payload` is the bincode-encoded
//! [`ModelArtifact`]. Decoding verifies every envelope field, the payload
//! digest, the forest structure, and that the artifact was trained on the
//! current feature schema in the current order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::RandomForest;
use crate::domain::FEATURE_NAMES;
use crate::ports::{ClassProbabilities, Classifier, ClassifierError};

/// Current artifact format version.
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

const ARTIFACT_MAGIC: [u8; 4] = *b"GSRF";

/// Errors raised while encoding or decoding an artifact.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Encoding failed: {0}")]
    Encoding(String),

    #[error("Decoding failed: {0}")]
    Decoding(String),

    #[error("Not a model artifact (bad magic)")]
    BadMagic,

    #[error("Unsupported artifact format version: {0}")]
    UnsupportedVersion(u32),

    #[error("Artifact checksum mismatch")]
    ChecksumMismatch,

    #[error("Feature schema mismatch: artifact has {found:?}, expected {expected:?}")]
    SchemaMismatch {
        found: Vec<String>,
        expected: Vec<String>,
    },

    #[error("Malformed model: {0}")]
    Malformed(String),
}

#[derive(Debug, Serialize, Deserialize)]
struct ArtifactEnvelope {
    magic: [u8; 4],
    format_version: u32,
    sha256_hex: String,
    payload: Vec<u8>,
}

fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// A trained forest plus the metadata needed to serve it safely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    /// Feature names in the order the forest was trained on
    pub feature_names: Vec<String>,

    /// When the artifact was produced
    pub created_at: DateTime<Utc>,

    /// Held-out accuracy reported by the trainer, if evaluated
    pub accuracy: Option<f64>,

    /// The fitted classifier
    pub forest: RandomForest,
}

impl ModelArtifact {
    /// Wrap a fitted forest trained on the current schema.
    #[must_use]
    pub fn new(forest: RandomForest, accuracy: Option<f64>) -> Self {
        Self {
            feature_names: FEATURE_NAMES.iter().map(|s| (*s).to_string()).collect(),
            created_at: Utc::now(),
            accuracy,
            forest,
        }
    }

    /// Serialize to the on-disk envelope.
    ///
    /// # Errors
    /// Returns `ArtifactError::Encoding` if bincode fails.
    pub fn encode(&self) -> Result<Vec<u8>, ArtifactError> {
        let payload =
            bincode::serialize(self).map_err(|e| ArtifactError::Encoding(e.to_string()))?;
        let envelope = ArtifactEnvelope {
            magic: ARTIFACT_MAGIC,
            format_version: ARTIFACT_FORMAT_VERSION,
            sha256_hex: sha256_hex(&payload),
            payload,
        };
        bincode::serialize(&envelope).map_err(|e| ArtifactError::Encoding(e.to_string()))
    }

    /// Deserialize and verify an on-disk envelope.
    ///
    /// # Errors
    /// Returns an `ArtifactError` describing the first check that failed.
    pub fn decode(bytes: &[u8]) -> Result<Self, ArtifactError> {
        let envelope: ArtifactEnvelope =
            bincode::deserialize(bytes).map_err(|e| ArtifactError::Decoding(e.to_string()))?;

        if envelope.magic != ARTIFACT_MAGIC {
            return Err(ArtifactError::BadMagic);
        }
        if envelope.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(ArtifactError::UnsupportedVersion(envelope.format_version));
        }
        if sha256_hex(&envelope.payload) != envelope.sha256_hex {
            return Err(ArtifactError::ChecksumMismatch);
        }

        let artifact: ModelArtifact = bincode::deserialize(&envelope.payload)
            .map_err(|e| ArtifactError::Decoding(e.to_string()))?;

        if artifact.feature_names.iter().map(String::as_str).ne(FEATURE_NAMES) {
            return Err(ArtifactError::SchemaMismatch {
                found: artifact.feature_names,
                expected: FEATURE_NAMES.iter().map(|s| (*s).to_string()).collect(),
            });
        }
        if artifact.forest.n_features() != FEATURE_NAMES.len() {
            return Err(ArtifactError::Malformed(format!(
                "forest expects {} features",
                artifact.forest.n_features()
            )));
        }
        artifact.forest.validate().map_err(ArtifactError::Malformed)?;

        Ok(artifact)
    }

    /// Hex SHA-256 of the encoded artifact, for logging.
    ///
    /// # Errors
    /// Returns error if encoding fails.
    pub fn fingerprint(&self) -> Result<String, ArtifactError> {
        Ok(sha256_hex(&self.encode()?))
    }
}

impl Classifier for ModelArtifact {
    fn n_features(&self) -> usize {
        self.forest.n_features()
    }

    fn classes(&self) -> &[u8] {
        self.forest.classes()
    }

    fn predict_proba(&self, x: &[f64]) -> Result<ClassProbabilities, ClassifierError> {
        self.forest.predict_proba(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::forest::ForestParams;
    use crate::adapters::synthetic::SyntheticGenerator;

    fn artifact() -> ModelArtifact {
        let data = SyntheticGenerator::new().generate(200, 42).expect("generate");
        let params = ForestParams {
            n_estimators: 5,
            ..ForestParams::default()
        };
        let forest = RandomForest::fit(&params, &data).expect("fit");
        ModelArtifact::new(forest, Some(0.9))
    }

    #[test]
    fn test_encode_decode() {
        let original = artifact();
        let bytes = original.encode().expect("encode");
        let decoded = ModelArtifact::decode(&bytes).expect("decode");
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_corrupted_payload_detected() {
        let mut bytes = artifact().encode().expect("encode");
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;

        let err = ModelArtifact::decode(&bytes).expect_err("must fail");
        assert!(matches!(err, ArtifactError::ChecksumMismatch));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(ModelArtifact::decode(b"not a model").is_err());
        assert!(ModelArtifact::decode(&[]).is_err());
    }

    #[test]
    fn test_schema_mismatch_detected() {
        let mut reordered = artifact();
        reordered.feature_names.swap(1, 2);
        let bytes = reordered.encode().expect("encode");

        let err = ModelArtifact::decode(&bytes).expect_err("must fail");
        assert!(matches!(err, ArtifactError::SchemaMismatch { .. }));
    }

    #[test]
    fn test_unsupported_version() {
        let payload = bincode::serialize(&artifact()).expect("payload");
        let envelope = ArtifactEnvelope {
            magic: ARTIFACT_MAGIC,
            format_version: 99,
            sha256_hex: sha256_hex(&payload),
            payload,
        };
        let bytes = bincode::serialize(&envelope).expect("envelope");

        let err = ModelArtifact::decode(&bytes).expect_err("must fail");
        assert!(matches!(err, ArtifactError::UnsupportedVersion(99)));
    }
}
