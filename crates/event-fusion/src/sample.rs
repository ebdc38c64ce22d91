//! Sensor samples for each fusion channel

use bounded_history::Timestamped;
use data_validator::{ValidationError, Validator};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fusion input channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sensor {
    Vision,
    Obd,
    Fatigue,
}

impl Sensor {
    pub const ALL: [Sensor; 3] = [Sensor::Vision, Sensor::Obd, Sensor::Fatigue];

    pub fn as_str(&self) -> &'static str {
        match self {
            Sensor::Vision => "vision",
            Sensor::Obd => "obd",
            Sensor::Fatigue => "fatigue",
        }
    }
}

impl fmt::Display for Sensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Road-scene summary from the vision pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisionSample {
    /// Arrival time, stamped by the engine
    #[serde(default)]
    pub timestamp: f64,
    pub lane_departure: bool,
    pub collision_warning: bool,
    pub object_count: u32,
    /// Meters to the nearest object, `None` when nothing was detected
    pub closest_object_distance: Option<f64>,
    pub confidence: f64,
}

impl Default for VisionSample {
    fn default() -> Self {
        Self {
            timestamp: 0.0,
            lane_departure: false,
            collision_warning: false,
            object_count: 0,
            closest_object_distance: None,
            confidence: 1.0,
        }
    }
}

impl VisionSample {
    pub fn validate(&self, validator: &Validator) -> Result<(), ValidationError> {
        validator.validate_timestamp(self.timestamp)?;
        validator.validate_distance(self.closest_object_distance)?;
        validator.validate_confidence("confidence", self.confidence)
    }
}

/// Vehicle-bus reading with derived behavior flags
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BusSample {
    #[serde(default)]
    pub timestamp: f64,
    pub speed_kmh: f64,
    pub rpm: f64,
    pub throttle_pct: f64,
    pub aggressive_acceleration: bool,
    pub aggressive_braking: bool,
    pub excessive_speed: bool,
    pub engine_stress: bool,
}

impl BusSample {
    pub fn validate(&self, validator: &Validator) -> Result<(), ValidationError> {
        validator.validate_timestamp(self.timestamp)?;
        validator.validate_speed(self.speed_kmh)?;
        validator.validate_rpm(self.rpm)?;
        validator.validate_throttle(self.throttle_pct)
    }

    /// True if any aggressive-driving flag is set
    pub fn is_aggressive(&self) -> bool {
        self.aggressive_acceleration
            || self.aggressive_braking
            || self.excessive_speed
            || self.engine_stress
    }
}

/// Driver-state summary from the driver monitor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FatigueSample {
    #[serde(default)]
    pub timestamp: f64,
    /// 0 (alert) to 100 (exhausted)
    pub fatigue_score: f64,
    pub blink_detected: bool,
    pub yawn_detected: bool,
    pub eye_aspect_ratio: f64,
    pub confidence: f64,
}

impl Default for FatigueSample {
    fn default() -> Self {
        Self {
            timestamp: 0.0,
            fatigue_score: 0.0,
            blink_detected: false,
            yawn_detected: false,
            eye_aspect_ratio: 0.3,
            confidence: 1.0,
        }
    }
}

impl FatigueSample {
    pub fn validate(&self, validator: &Validator) -> Result<(), ValidationError> {
        validator.validate_timestamp(self.timestamp)?;
        validator.validate_fatigue_score(self.fatigue_score)?;
        validator.validate_eye_aspect_ratio(self.eye_aspect_ratio)?;
        validator.validate_confidence("confidence", self.confidence)
    }
}

impl Timestamped for VisionSample {
    fn timestamp(&self) -> f64 {
        self.timestamp
    }
}

impl Timestamped for BusSample {
    fn timestamp(&self) -> f64 {
        self.timestamp
    }
}

impl Timestamped for FatigueSample {
    fn timestamp(&self) -> f64 {
        self.timestamp
    }
}
