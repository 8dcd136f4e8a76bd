//! Offline trainer for the Glucosense risk model.
//!
//! Generates the synthetic cohort, fits the random forest, prints held-out
//! metrics and writes the verified artifact the inference binary loads.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin train_model -- [--samples <n>] [--seed <u64>] [--trees <n>] [--out <path>]
//! ```
//!
//! Flags override the `GLUCOSENSE_*` environment settings.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};

use glucosense::adapters::storage::FileArtifactStore;
use glucosense::application::TrainingService;
use glucosense::config::{StoreConfig, TrainingConfig};

fn usage() -> String {
    "Usage: train_model [--samples <n>] [--seed <u64>] [--trees <n>] [--out <path>]".to_string()
}

fn parse_value<T: std::str::FromStr>(flag: &str, value: Option<String>) -> Result<T> {
    let value = value.with_context(usage)?;
    value
        .trim()
        .parse::<T>()
        .map_err(|_| anyhow::anyhow!("{flag} got an invalid value: {value}"))
}

fn parse_args(training: &mut TrainingConfig, store: &mut StoreConfig) -> Result<()> {
    let mut args = env::args().skip(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--samples" => training.n_samples = parse_value("--samples", args.next())?,
            "--seed" => training.seed = parse_value("--seed", args.next())?,
            "--trees" => training.forest.n_estimators = parse_value("--trees", args.next())?,
            "--out" => {
                let v = args.next().with_context(usage)?;
                store.artifact_path = PathBuf::from(v);
            }
            "-h" | "--help" => bail!(usage()),
            other => bail!("Unknown argument {other}\n{}", usage()),
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    let _guard = glucosense::logging::init().context("Failed to initialise logging")?;

    let mut training = TrainingConfig::from_env_or_default();
    let mut store = StoreConfig::from_env_or_default();
    parse_args(&mut training, &mut store)?;

    tracing::info!(
        "Training on {} synthetic samples (seed {})",
        training.n_samples,
        training.seed
    );

    let backend = Arc::new(FileArtifactStore::new(&store.artifact_path));
    let outcome = TrainingService::new(backend, training).run()?;

    println!("Model Accuracy: {:.3}", outcome.accuracy);
    println!();
    println!("Classification Report:");
    println!("{}", outcome.report);

    println!("Feature Importances:");
    for (feature, importance) in &outcome.feature_importances {
        println!("  {:<16} {importance:.4}", feature.name());
    }
    println!();

    tracing::info!("Artifact fingerprint: {}", outcome.artifact.fingerprint()?);
    println!(
        "Model saved to {} ({} train / {} test samples)",
        store.artifact_path.display(),
        outcome.train_size,
        outcome.test_size
    );
    Ok(())
}
