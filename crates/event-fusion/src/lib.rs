//! Event Fusion Engine
//!
//! Fuses asynchronously arriving samples from three producers:
//! - Vision (lane departure, forward objects)
//! - Vehicle bus (speed, RPM, throttle, driving behavior flags)
//! - Driver monitor (fatigue score, blinks, yawns)
//!
//! Each channel keeps a bounded history. On demand the engine computes
//! per-domain risks, raises alerts, and produces a composite safety score.

pub mod clock;
pub mod config;
pub mod engine;
pub mod producer;
pub mod risk;
pub mod sample;
pub mod weights;

pub use clock::{Clock, ManualClock, SystemClock};
pub use crate::config::{ExportSettings, FusionSettings, HistorySettings};
pub use engine::{Assessment, EngineSummary, FusionEngine, FusionSnapshot};
pub use sample::{BusSample, FatigueSample, Sensor, VisionSample};
pub use weights::{FusionWeights, WeightRegistry};

pub use alerting::{Alert, AlertKind, AlertThresholds, RiskSet, Severity};
pub use data_validator::ValidationError;
pub use storage::{PersistenceError, SnapshotFormat};

use thiserror::Error;

/// Fusion error types
#[derive(Error, Debug)]
pub enum FusionError {
    /// Sample rejected at the ingestion boundary
    #[error("Invalid sample: {0}")]
    InvalidSample(#[from] ValidationError),

    #[error("Persistence failed: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<alerting::ThresholdError> for FusionError {
    fn from(err: alerting::ThresholdError) -> Self {
        FusionError::Config(err.to_string())
    }
}

impl From<::config::ConfigError> for FusionError {
    fn from(err: ::config::ConfigError) -> Self {
        FusionError::Config(err.to_string())
    }
}

/// Register metric descriptions with the installed recorder
pub fn describe_metrics() {
    metrics::describe_counter!(
        "fusion_samples_ingested_total",
        "Samples accepted into a channel history"
    );
    metrics::describe_counter!(
        "fusion_samples_rejected_total",
        "Samples rejected by boundary validation"
    );
    metrics::describe_gauge!(
        "fusion_safety_score",
        "Overall safety score of the latest assessment"
    );
    metrics::describe_counter!("fusion_alerts_total", "Alerts raised by assessments");
}
