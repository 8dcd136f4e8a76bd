//! Synthetic adapter: seeded generator for labeled training data.
//!
//! Each feature is drawn independently from a parametric distribution and
//! clipped into its valid interval (see [`Feature::valid_range`]). The binary
//! outcome comes from thresholding a latent score built from clinical risk
//! markers plus Gaussian noise.
//!
//! # Determinism
//!
//! All draws come from one `ChaCha8Rng` seeded with the caller's seed, in a
//! fixed order: feature columns in schema order, then the noise column. The
//! same `(n, seed)` pair always yields a bit-identical [`TrainingSet`].

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Gamma, Normal, Poisson};
use serde::{Deserialize, Serialize};

use crate::domain::{Feature, FeatureRecord, TrainingSample, TrainingSet, FEATURE_COUNT};
use crate::{GlucosenseError, Result};

/// Parametric distribution for one feature column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sampler {
    Poisson { lambda: f64 },
    Normal { mean: f64, std_dev: f64 },
    Gamma { shape: f64, scale: f64 },
}

enum CompiledSampler {
    Poisson(Poisson<f64>),
    Normal(Normal<f64>),
    Gamma(Gamma<f64>),
}

impl CompiledSampler {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match self {
            Self::Poisson(d) => d.sample(rng),
            Self::Normal(d) => d.sample(rng),
            Self::Gamma(d) => d.sample(rng),
        }
    }
}

impl Sampler {
    fn compile(&self) -> Result<CompiledSampler> {
        let invalid = |e: String| GlucosenseError::InvalidGenerationRequest(e);
        Ok(match *self {
            Self::Poisson { lambda } => CompiledSampler::Poisson(
                Poisson::new(lambda).map_err(|e| invalid(format!("poisson({lambda}): {e}")))?,
            ),
            Self::Normal { mean, std_dev } => CompiledSampler::Normal(
                Normal::new(mean, std_dev)
                    .map_err(|e| invalid(format!("normal({mean}, {std_dev}): {e}")))?,
            ),
            Self::Gamma { shape, scale } => CompiledSampler::Gamma(
                Gamma::new(shape, scale)
                    .map_err(|e| invalid(format!("gamma({shape}, {scale}): {e}")))?,
            ),
        })
    }
}

/// Distribution table and labeling constants for the generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorParams {
    /// One sampler per feature, in schema order
    pub samplers: [Sampler; FEATURE_COUNT],

    /// Standard deviation of the noise added to the latent score
    pub noise_std_dev: f64,

    /// Latent scores strictly above this value are labeled positive
    pub label_threshold: f64,
}

impl Default for GeneratorParams {
    fn default() -> Self {
        Self {
            samplers: [
                Sampler::Poisson { lambda: 2.0 },
                Sampler::Normal { mean: 120.0, std_dev: 30.0 },
                Sampler::Normal { mean: 80.0, std_dev: 15.0 },
                Sampler::Normal { mean: 20.0, std_dev: 10.0 },
                Sampler::Normal { mean: 80.0, std_dev: 40.0 },
                Sampler::Normal { mean: 25.0, std_dev: 5.0 },
                Sampler::Gamma { shape: 0.5, scale: 1.0 },
                Sampler::Normal { mean: 35.0, std_dev: 15.0 },
            ],
            noise_std_dev: 0.1,
            label_threshold: 0.3,
        }
    }
}

/// Latent risk score without noise.
///
/// Weighted sum of threshold indicators and the scaled pedigree score.
#[must_use]
pub fn latent_risk(record: &FeatureRecord) -> f64 {
    let indicator = |flag: bool| if flag { 1.0 } else { 0.0 };

    0.1 * indicator(record.glucose > 125.0)
        + 0.08 * indicator(record.bmi > 30.0)
        + 0.06 * indicator(record.age > 45.0)
        + 0.05 * indicator(record.blood_pressure > 90.0)
        + 0.04 * record.pedigree_score
        + 0.03 * indicator(record.pregnancies > 3)
}

/// Seeded synthetic training data generator.
#[derive(Debug, Clone, Default)]
pub struct SyntheticGenerator {
    params: GeneratorParams,
}

impl SyntheticGenerator {
    /// Create a generator with the default distribution table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a generator with a custom distribution table.
    #[must_use]
    pub fn with_params(params: GeneratorParams) -> Self {
        Self { params }
    }

    #[must_use]
    pub fn params(&self) -> &GeneratorParams {
        &self.params
    }

    /// Generate `n` labeled samples.
    ///
    /// # Errors
    /// Returns `InvalidGenerationRequest` if `n` is zero or a distribution
    /// parameter is invalid. Nothing is sampled in that case.
    pub fn generate(&self, n: usize, seed: u64) -> Result<TrainingSet> {
        if n == 0 {
            return Err(GlucosenseError::InvalidGenerationRequest(
                "sample count must be positive".to_string(),
            ));
        }

        let samplers = self
            .params
            .samplers
            .iter()
            .map(Sampler::compile)
            .collect::<Result<Vec<_>>>()?;
        let noise = Normal::new(0.0, self.params.noise_std_dev).map_err(|e| {
            GlucosenseError::InvalidGenerationRequest(format!(
                "noise std dev {}: {e}",
                self.params.noise_std_dev
            ))
        })?;

        tracing::debug!("Generating {n} synthetic samples (seed={seed})");
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let mut columns: Vec<Vec<f64>> = Vec::with_capacity(FEATURE_COUNT);
        for (feature, sampler) in Feature::ALL.iter().zip(&samplers) {
            let (lo, hi) = feature.valid_range();
            let column = (0..n)
                .map(|_| sampler.sample(&mut rng).clamp(lo, hi))
                .collect();
            columns.push(column);
        }
        let noise_column: Vec<f64> = (0..n).map(|_| noise.sample(&mut rng)).collect();

        let mut samples = Vec::with_capacity(n);
        for (i, noise) in noise_column.iter().enumerate() {
            let row: Vec<f64> = columns.iter().map(|c| c[i]).collect();
            let features =
                FeatureRecord::from_vec(&row).map_err(GlucosenseError::InvalidGenerationRequest)?;
            let score = latent_risk(&features) + noise;
            samples.push(TrainingSample {
                features,
                outcome: u8::from(score > self.params.label_threshold),
            });
        }

        let data = TrainingSet::new(samples);
        tracing::info!(
            "Generated {} samples, positive rate {:.1}%",
            data.len(),
            data.positive_rate() * 100.0
        );

        Ok(data)
    }
}
