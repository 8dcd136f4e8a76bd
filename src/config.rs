//! Configuration for training and model storage.
//!
//! Defaults reproduce the reference training run (1000 samples, seed 42,
//! 80/20 split). Every struct can be overridden from the environment on a
//! best-effort basis: unparseable values are logged and ignored.

use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::adapters::forest::ForestParams;
use crate::adapters::storage::DEFAULT_ARTIFACT_PATH;
use crate::adapters::synthetic::GeneratorParams;

/// Read and parse an environment variable.
///
/// Returns `None` when the variable is unset or does not parse.
pub(crate) fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!("Ignoring invalid value for {name}: {raw:?}");
            None
        }
    }
}

/// Parameters of one training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Number of synthetic samples to generate
    pub n_samples: usize,

    /// Generator seed
    pub seed: u64,

    /// Fraction of samples held out for evaluation
    pub test_fraction: f64,

    /// Seed for the stratified split
    pub split_seed: u64,

    pub generator: GeneratorParams,

    pub forest: ForestParams,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            n_samples: 1000,
            seed: 42,
            test_fraction: 0.2,
            split_seed: 42,
            generator: GeneratorParams::default(),
            forest: ForestParams::default(),
        }
    }
}

impl TrainingConfig {
    /// Load config overrides from environment (best-effort).
    ///
    /// Supported:
    /// - GLUCOSENSE_SAMPLES
    /// - GLUCOSENSE_SEED
    /// - GLUCOSENSE_TEST_FRACTION (exclusive range 0..1)
    /// - GLUCOSENSE_SPLIT_SEED
    /// - forest overrides, see [`ForestParams::from_env_or_default`]
    #[must_use]
    pub fn from_env_or_default() -> Self {
        let mut cfg = Self {
            forest: ForestParams::from_env_or_default(),
            ..Self::default()
        };

        if let Some(n) = env_parse::<usize>("GLUCOSENSE_SAMPLES") {
            cfg.n_samples = n;
        }
        if let Some(seed) = env_parse::<u64>("GLUCOSENSE_SEED") {
            cfg.seed = seed;
        }
        if let Some(f) = env_parse::<f64>("GLUCOSENSE_TEST_FRACTION") {
            if f.is_finite() && f > 0.0 && f < 1.0 {
                cfg.test_fraction = f;
            } else {
                tracing::warn!("GLUCOSENSE_TEST_FRACTION must be in (0, 1), got {f}");
            }
        }
        if let Some(seed) = env_parse::<u64>("GLUCOSENSE_SPLIT_SEED") {
            cfg.split_seed = seed;
        }

        cfg
    }

    /// Check values that would make a run meaningless.
    ///
    /// # Errors
    /// Returns `Config` describing the first invalid value.
    pub fn validate(&self) -> crate::Result<()> {
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(crate::GlucosenseError::Config(format!(
                "test_fraction must be in (0, 1), got {}",
                self.test_fraction
            )));
        }
        if self.forest.n_estimators == 0 {
            return Err(crate::GlucosenseError::Config(
                "n_estimators must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Location of the persisted model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    pub artifact_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            artifact_path: PathBuf::from(DEFAULT_ARTIFACT_PATH),
        }
    }
}

impl StoreConfig {
    /// Load config overrides from environment (best-effort).
    ///
    /// Supported:
    /// - GLUCOSENSE_MODEL_PATH
    #[must_use]
    pub fn from_env_or_default() -> Self {
        let mut cfg = Self::default();
        if let Ok(path) = std::env::var("GLUCOSENSE_MODEL_PATH") {
            let path = path.trim();
            if !path.is_empty() {
                cfg.artifact_path = PathBuf::from(path);
            }
        }
        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = TrainingConfig::default();
        assert_eq!(cfg.n_samples, 1000);
        assert_eq!(cfg.seed, 42);
        assert!((cfg.test_fraction - 0.2).abs() < f64::EPSILON);
        assert!(cfg.validate().is_ok());

        assert_eq!(
            StoreConfig::default().artifact_path,
            PathBuf::from("models/diabetes_model.bin")
        );
    }

    #[test]
    fn test_validate_rejects_bad_fraction() {
        let cfg = TrainingConfig {
            test_fraction: 1.0,
            ..TrainingConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_json_roundtrip() {
        let cfg = TrainingConfig::default();
        let json = serde_json::to_string(&cfg).expect("serialize");
        let back: TrainingConfig = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, cfg);
    }

    #[test]
    fn test_env_parse_rejects_garbage() {
        std::env::set_var("GLUCOSENSE_TEST_ENV_PARSE", "not-a-number");
        assert_eq!(env_parse::<usize>("GLUCOSENSE_TEST_ENV_PARSE"), None);
        std::env::set_var("GLUCOSENSE_TEST_ENV_PARSE", " 12 ");
        assert_eq!(env_parse::<usize>("GLUCOSENSE_TEST_ENV_PARSE"), Some(12));
        std::env::remove_var("GLUCOSENSE_TEST_ENV_PARSE");
    }
}
