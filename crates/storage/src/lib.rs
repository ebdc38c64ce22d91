//! Storage Layer
//!
//! Persists fusion snapshots and assessments to disk. Export failures are
//! reported to the caller and never affect in-memory engine state.

mod exporter;

pub use exporter::{SnapshotExporter, SnapshotFormat};

use thiserror::Error;

/// Persistence errors
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Serialization error: {0}")]
    Serialization(String),
}
