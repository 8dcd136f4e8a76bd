//! Glucosense: Diabetes risk assessment from eight clinical measurements.
//!
//! Reads one JSON request, scores it with the persisted model and prints one
//! JSON assessment.
//!
//! # Usage
//!
//! ```bash
//! glucosense [--model <path>] [<request.json> | -]
//! ```
//!
//! The request has the shape `{"record": {...}, "gender": "Female"}`. When no
//! file is given, or the file is `-`, the request is read from stdin.

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use glucosense::adapters::storage::FileArtifactStore;
use glucosense::application::{InferenceService, ModelStore};
use glucosense::config::StoreConfig;
use glucosense::{FeatureRecord, Gender};

#[derive(Debug, Deserialize)]
struct AssessmentRequest {
    record: FeatureRecord,
    #[serde(default)]
    gender: Gender,
}

struct Args {
    model: Option<PathBuf>,
    input: Option<PathBuf>,
}

fn usage() -> String {
    "Usage: glucosense [--model <path>] [<request.json> | -]".to_string()
}

fn parse_args() -> Result<Args> {
    let mut args = std::env::args().skip(1);
    let mut parsed = Args {
        model: None,
        input: None,
    };

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--model" => {
                let v = args.next().with_context(usage)?;
                parsed.model = Some(PathBuf::from(v));
            }
            "-h" | "--help" => bail!(usage()),
            "-" => parsed.input = None,
            _ => {
                if parsed.input.is_some() {
                    bail!(usage());
                }
                parsed.input = Some(PathBuf::from(arg));
            }
        }
    }

    Ok(parsed)
}

fn read_request(input: Option<&PathBuf>) -> Result<AssessmentRequest> {
    let raw = match input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read request {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read request from stdin")?;
            buf
        }
    };

    serde_json::from_str(&raw).context("Malformed assessment request")
}

fn main() -> Result<()> {
    let _guard = glucosense::logging::init().context("Failed to initialise logging")?;
    let args = parse_args()?;

    let mut config = StoreConfig::from_env_or_default();
    if let Some(path) = args.model {
        config.artifact_path = path;
    }

    let request = read_request(args.input.as_ref())?;
    let flagged = request.record.out_of_range_fields();
    if !flagged.is_empty() {
        let names: Vec<&str> = flagged.iter().map(|f| f.name()).collect();
        tracing::warn!("Input outside the expected ranges: {}", names.join(", "));
    }

    let store = ModelStore::new(Arc::new(FileArtifactStore::new(&config.artifact_path)));
    let service = InferenceService::from_store(&store)?;
    let assessment = service.assess(&request.record, request.gender)?;

    println!("{}", serde_json::to_string_pretty(&assessment)?);
    Ok(())
}
