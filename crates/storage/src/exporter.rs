//! Snapshot Exporter Implementation

use crate::PersistenceError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info, warn};

/// On-disk document format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotFormat {
    /// Pretty-printed JSON (stable field names for downstream tooling)
    #[default]
    Json,
    /// Compact binary postcard encoding
    Postcard,
}

impl FromStr for SnapshotFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(SnapshotFormat::Json),
            "postcard" => Ok(SnapshotFormat::Postcard),
            other => Err(format!("unknown snapshot format: {}", other)),
        }
    }
}

/// Writes serializable documents to disk
#[derive(Debug, Clone, Copy, Default)]
pub struct SnapshotExporter {
    format: SnapshotFormat,
}

impl SnapshotExporter {
    pub fn new(format: SnapshotFormat) -> Self {
        Self { format }
    }

    /// Encode a document in the configured format
    pub fn encode<T: Serialize>(&self, doc: &T) -> Result<Vec<u8>, PersistenceError> {
        match self.format {
            SnapshotFormat::Json => serde_json::to_vec_pretty(doc)
                .map_err(|e| PersistenceError::Serialization(e.to_string())),
            SnapshotFormat::Postcard => postcard::to_allocvec(doc)
                .map_err(|e| PersistenceError::Serialization(e.to_string())),
        }
    }

    /// Write a document to `path`.
    ///
    /// The bytes go to a temp file in the target directory and are renamed
    /// into place, so readers never observe a partially written document.
    /// The temp file is removed if either the write or the rename fails.
    pub fn export<T: Serialize>(
        &self,
        doc: &T,
        path: impl AsRef<Path>,
    ) -> Result<(), PersistenceError> {
        let path = path.as_ref();
        let bytes = self.encode(doc)?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut tmp = tempfile::Builder::new()
            .prefix(".fusion-export")
            .suffix(".tmp")
            .tempfile_in(dir)
            .map_err(|e| io_error(dir, e))?;
        tmp.write_all(&bytes).map_err(|e| io_error(tmp.path(), e))?;
        tmp.persist(path).map_err(|e| {
            warn!("Rename to {} failed, temp file dropped", path.display());
            io_error(path, e.error)
        })?;

        info!("Exported {} bytes to {} ({:?})", bytes.len(), path.display(), self.format);
        Ok(())
    }

    /// Read a document previously written with the same format
    pub fn load<T: DeserializeOwned>(&self, path: impl AsRef<Path>) -> Result<T, PersistenceError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| io_error(path, e))?;
        debug!("Read {} bytes from {}", bytes.len(), path.display());

        match self.format {
            SnapshotFormat::Json => serde_json::from_slice(&bytes)
                .map_err(|e| PersistenceError::Serialization(e.to_string())),
            SnapshotFormat::Postcard => postcard::from_bytes(&bytes)
                .map_err(|e| PersistenceError::Serialization(e.to_string())),
        }
    }
}

fn io_error(path: &Path, source: std::io::Error) -> PersistenceError {
    PersistenceError::Io {
        path: path.display().to_string(),
        source,
    }
}
