//! Fusion configuration

use crate::weights::FusionWeights;
use crate::FusionError;
use alerting::AlertThresholds;
use bounded_history::DEFAULT_CAPACITY;
use data_validator::ValidationConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use storage::SnapshotFormat;
use tracing::info;

/// Environment variable prefix, e.g. `FUSION_HISTORY__CAPACITY=20`
pub const ENV_PREFIX: &str = "FUSION";

/// History configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistorySettings {
    /// Samples retained per channel
    pub capacity: usize,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
        }
    }
}

/// Snapshot export configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    pub format: SnapshotFormat,
}

/// Fusion engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionSettings {
    pub history: HistorySettings,
    /// Initial fusion weights
    pub weights: FusionWeights,
    pub thresholds: AlertThresholds,
    /// Accepted sample field ranges
    pub validation: ValidationConfig,
    pub export: ExportSettings,
}

impl FusionSettings {
    /// Load settings from an optional file plus `FUSION_*` environment
    /// overrides; anything unset keeps its default.
    pub fn load(path: Option<&Path>) -> Result<Self, FusionError> {
        Self::load_with_env(path, None)
    }

    /// Like [`FusionSettings::load`], reading overrides from `env` instead of
    /// the process environment when it is given
    pub fn load_with_env(
        path: Option<&Path>,
        env: Option<::config::Map<String, String>>,
    ) -> Result<Self, FusionError> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = path {
            info!("Loading fusion settings from {}", path.display());
            builder = builder.add_source(::config::File::from(path).required(true));
        }
        builder = builder.add_source(
            ::config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(env),
        );

        let settings: FusionSettings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), FusionError> {
        if self.history.capacity == 0 {
            return Err(FusionError::Config("history.capacity must be at least 1".into()));
        }
        self.weights.validate().map_err(FusionError::Config)?;
        self.thresholds.validate()?;
        Ok(())
    }
}
