//! Tracing subscriber setup for the binaries.
//!
//! Log destination is chosen by `GLUCOSENSE_LOG_MODE`:
//! - `stdout`: log to stdout
//! - `file`: append to `GLUCOSENSE_LOG_FILE` (default `glucosense.log`)
//! - `auto` (default): stderr, so stdout stays clean for JSON output
//!
//! The filter comes from `RUST_LOG` and defaults to `info`.

use std::io;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LOG_FILE: &str = "glucosense.log";

/// Install the global subscriber.
///
/// The returned guard flushes buffered log lines on drop and must be kept
/// alive for the lifetime of `main`.
///
/// # Errors
/// Returns error if the log file cannot be opened.
pub fn init() -> io::Result<WorkerGuard> {
    let log_mode = std::env::var("GLUCOSENSE_LOG_MODE").unwrap_or_else(|_| "auto".to_string());

    let (writer, guard) = match log_mode.as_str() {
        "file" => {
            let log_file = std::env::var("GLUCOSENSE_LOG_FILE")
                .unwrap_or_else(|_| DEFAULT_LOG_FILE.to_string());

            if let Some(parent) = std::path::Path::new(&log_file).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }

            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_file)?;
            tracing_appender::non_blocking(file)
        }
        "stdout" => tracing_appender::non_blocking(io::stdout()),
        _ => tracing_appender::non_blocking(io::stderr()),
    };

    // A second init (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(writer))
        .try_init();

    Ok(guard)
}
