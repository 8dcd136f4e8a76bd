//! Adapters layer: Concrete implementations of ports.
//!
//! These modules contain the actual algorithms and backends:
//! - `synthetic`: seeded training data generator
//! - `forest`: random forest classifier and its artifact codec
//! - `storage`: file and in-memory artifact stores

pub mod forest;
pub mod storage;
pub mod synthetic;

// Re-export storage error for lib.rs
pub use storage::StorageError;
