//! Fusion weight registry

use crate::sample::Sensor;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use tracing::{debug, info};

/// Per-sensor fusion weights
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionWeights {
    pub vision: f64,
    pub obd: f64,
    pub fatigue: f64,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            vision: 0.5,
            obd: 0.3,
            fatigue: 0.2,
        }
    }
}

impl FusionWeights {
    pub fn get(&self, sensor: Sensor) -> f64 {
        match sensor {
            Sensor::Vision => self.vision,
            Sensor::Obd => self.obd,
            Sensor::Fatigue => self.fatigue,
        }
    }

    pub fn set(&mut self, sensor: Sensor, weight: f64) {
        match sensor {
            Sensor::Vision => self.vision = weight,
            Sensor::Obd => self.obd = weight,
            Sensor::Fatigue => self.fatigue = weight,
        }
    }

    pub fn sum(&self) -> f64 {
        self.vision + self.obd + self.fatigue
    }

    /// Check every weight is finite and non-negative
    pub fn validate(&self) -> Result<(), String> {
        for sensor in Sensor::ALL {
            let weight = self.get(sensor);
            if !weight.is_finite() || weight < 0.0 {
                return Err(format!("weight {} = {} must be a non-negative number", sensor, weight));
            }
        }
        Ok(())
    }

    /// Re-normalize from per-sensor confidence.
    ///
    /// Returns false (weights untouched) when the finite confidences do not
    /// sum to a positive total. Otherwise negative or non-finite values count
    /// as zero and each listed sensor gets `confidence / total` over the
    /// clamped values; sensors not listed keep their weight, so a partial map
    /// need not sum to 1.
    pub fn adjust(&mut self, confidence: &HashMap<Sensor, f64>) -> bool {
        let raw_total: f64 = confidence.values().filter(|c| c.is_finite()).sum();
        if raw_total <= 0.0 {
            return false;
        }

        let clamped: Vec<(Sensor, f64)> = confidence
            .iter()
            .map(|(&sensor, &c)| (sensor, if c.is_finite() && c > 0.0 { c } else { 0.0 }))
            .collect();
        let total: f64 = clamped.iter().map(|(_, c)| c).sum();

        for (sensor, c) in clamped {
            self.set(sensor, c / total);
        }
        true
    }
}

/// Shared, lock-protected weights
#[derive(Debug, Default)]
pub struct WeightRegistry {
    weights: RwLock<FusionWeights>,
}

impl WeightRegistry {
    pub fn new(weights: FusionWeights) -> Self {
        Self {
            weights: RwLock::new(weights),
        }
    }

    /// Copy of the live weights
    pub fn current(&self) -> FusionWeights {
        *self.weights.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace all weights (configuration load)
    pub fn replace(&self, weights: FusionWeights) {
        *self.weights.write().unwrap_or_else(PoisonError::into_inner) = weights;
        info!("Fusion weights replaced: {:?}", weights);
    }

    /// Confidence-driven re-normalization; an all-zero map is a no-op
    pub fn adjust(&self, confidence: &HashMap<Sensor, f64>) -> bool {
        let mut weights = self.weights.write().unwrap_or_else(PoisonError::into_inner);
        let changed = weights.adjust(confidence);
        if changed {
            info!("Fusion weights adjusted: {:?}", *weights);
        } else {
            debug!("Weight adjustment skipped: non-positive confidence total");
        }
        changed
    }
}
