//! Data Validator for Range Checking

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Validation configuration (inclusive ranges)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Sample timestamp range (seconds since UNIX epoch)
    pub timestamp_range: (f64, f64),
    /// Producer confidence range
    pub confidence_range: (f64, f64),
    /// Fatigue score range
    pub fatigue_score_range: (f64, f64),
    /// Eye aspect ratio range
    pub eye_aspect_ratio_range: (f64, f64),
    /// Vehicle speed range (km/h)
    pub speed_range: (f64, f64),
    /// Engine RPM range
    pub rpm_range: (f64, f64),
    /// Throttle position range (%)
    pub throttle_range: (f64, f64),
    /// Object distance range (meters)
    pub distance_range: (f64, f64),
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            timestamp_range: (0.0, f64::MAX),
            confidence_range: (0.0, 1.0),
            fatigue_score_range: (0.0, 100.0),
            eye_aspect_ratio_range: (0.0, 1.0),
            speed_range: (0.0, 400.0),
            rpm_range: (0.0, 12_000.0),
            throttle_range: (0.0, 100.0),
            distance_range: (0.0, f64::MAX),
        }
    }
}

/// Validator for sample fields
#[derive(Debug, Clone, Default)]
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    /// Create a new validator with given config
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Reject NaN and infinities
    pub fn validate_finite(&self, field: &'static str, value: f64) -> Result<(), ValidationError> {
        if value.is_finite() {
            Ok(())
        } else {
            debug!("Rejected non-finite {}", field);
            Err(ValidationError::NotFinite { field })
        }
    }

    /// Validate a single value against a range
    pub fn validate_range(
        &self,
        field: &'static str,
        value: f64,
        range: (f64, f64),
    ) -> Result<(), ValidationError> {
        self.validate_finite(field, value)?;
        if value < range.0 || value > range.1 {
            debug!("Rejected {} = {}", field, value);
            Err(ValidationError::OutOfRange {
                field,
                value,
                min: range.0,
                max: range.1,
            })
        } else {
            Ok(())
        }
    }

    pub fn validate_timestamp(&self, timestamp: f64) -> Result<(), ValidationError> {
        self.validate_range("timestamp", timestamp, self.config.timestamp_range)
    }

    /// Validate a confidence scalar; `field` distinguishes the producer
    pub fn validate_confidence(
        &self,
        field: &'static str,
        confidence: f64,
    ) -> Result<(), ValidationError> {
        self.validate_range(field, confidence, self.config.confidence_range)
    }

    pub fn validate_fatigue_score(&self, score: f64) -> Result<(), ValidationError> {
        self.validate_range("fatigue_score", score, self.config.fatigue_score_range)
    }

    pub fn validate_eye_aspect_ratio(&self, ear: f64) -> Result<(), ValidationError> {
        self.validate_range("eye_aspect_ratio", ear, self.config.eye_aspect_ratio_range)
    }

    pub fn validate_speed(&self, speed: f64) -> Result<(), ValidationError> {
        self.validate_range("speed_kmh", speed, self.config.speed_range)
    }

    pub fn validate_rpm(&self, rpm: f64) -> Result<(), ValidationError> {
        self.validate_range("rpm", rpm, self.config.rpm_range)
    }

    pub fn validate_throttle(&self, throttle: f64) -> Result<(), ValidationError> {
        self.validate_range("throttle_pct", throttle, self.config.throttle_range)
    }

    /// Validate the closest object distance; `None` means no object
    pub fn validate_distance(&self, distance: Option<f64>) -> Result<(), ValidationError> {
        match distance {
            Some(d) => self.validate_range("closest_object_distance", d, self.config.distance_range),
            None => Ok(()),
        }
    }
}
