//! Fusion engine

use crate::clock::{Clock, SystemClock};
use crate::config::FusionSettings;
use crate::risk;
use crate::sample::{BusSample, FatigueSample, Sensor, VisionSample};
use crate::weights::{FusionWeights, WeightRegistry};
use crate::FusionError;
use alerting::{Alert, AlertPolicy, AlertThresholds, RiskSet};
use bounded_history::BoundedHistory;
use data_validator::{ValidationError, Validator};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use storage::SnapshotExporter;
use tracing::{debug, info, warn};

/// Safety assessment, built fresh on every request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub timestamp: f64,
    pub risks: RiskSet,
    pub alerts: Vec<Alert>,
    pub recommendations: Vec<String>,
    /// 0 (unsafe) to 100 (no risk)
    pub overall_safety_score: f64,
}

/// Entry counts and live weights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSummary {
    pub vision_entries: usize,
    pub obd_entries: usize,
    pub fatigue_entries: usize,
    pub last_update: f64,
    pub weights: FusionWeights,
}

/// Exported engine state; field names are stable for downstream tooling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusionSnapshot {
    pub vision_data: Vec<VisionSample>,
    pub obd_data: Vec<BusSample>,
    pub fatigue_data: Vec<FatigueSample>,
    pub weights: FusionWeights,
    pub thresholds: AlertThresholds,
}

/// Sensor fusion engine.
///
/// Each channel history sits behind its own mutex, so producers on
/// different channels never contend. Assessment copies one channel at a
/// time and never holds two channel locks together.
#[derive(Debug)]
pub struct FusionEngine {
    vision: Mutex<BoundedHistory<VisionSample>>,
    obd: Mutex<BoundedHistory<BusSample>>,
    fatigue: Mutex<BoundedHistory<FatigueSample>>,
    weights: WeightRegistry,
    thresholds: RwLock<AlertThresholds>,
    validator: Validator,
    exporter: SnapshotExporter,
    clock: Arc<dyn Clock>,
}

impl FusionEngine {
    /// Create an engine from validated settings
    pub fn new(settings: &FusionSettings) -> Result<Self, FusionError> {
        settings.validate()?;
        info!(
            "Creating fusion engine: capacity {}, weights {:?}",
            settings.history.capacity, settings.weights
        );
        Ok(Self::from_settings(settings))
    }

    fn from_settings(settings: &FusionSettings) -> Self {
        let capacity = settings.history.capacity;
        Self {
            vision: Mutex::new(BoundedHistory::new(capacity)),
            obd: Mutex::new(BoundedHistory::new(capacity)),
            fatigue: Mutex::new(BoundedHistory::new(capacity)),
            weights: WeightRegistry::new(settings.weights),
            thresholds: RwLock::new(settings.thresholds),
            validator: Validator::new(settings.validation.clone()),
            exporter: SnapshotExporter::new(settings.export.format),
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the time source used to stamp samples
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Stamp, validate, and store a vision sample
    pub fn ingest_vision(&self, mut sample: VisionSample) -> Result<(), FusionError> {
        sample.timestamp = self.clock.now();
        self.admit(Sensor::Vision, sample.validate(&self.validator))?;
        lock(&self.vision).push(sample);
        Ok(())
    }

    /// Stamp, validate, and store a vehicle-bus sample
    pub fn ingest_obd(&self, mut sample: BusSample) -> Result<(), FusionError> {
        sample.timestamp = self.clock.now();
        self.admit(Sensor::Obd, sample.validate(&self.validator))?;
        lock(&self.obd).push(sample);
        Ok(())
    }

    /// Stamp, validate, and store a driver-monitor sample
    pub fn ingest_fatigue(&self, mut sample: FatigueSample) -> Result<(), FusionError> {
        sample.timestamp = self.clock.now();
        self.admit(Sensor::Fatigue, sample.validate(&self.validator))?;
        lock(&self.fatigue).push(sample);
        Ok(())
    }

    fn admit(&self, sensor: Sensor, checked: Result<(), ValidationError>) -> Result<(), FusionError> {
        match checked {
            Ok(()) => {
                metrics::counter!("fusion_samples_ingested_total", "channel" => sensor.as_str())
                    .increment(1);
                Ok(())
            }
            Err(err) => {
                warn!("Rejected {} sample: {}", sensor, err);
                metrics::counter!("fusion_samples_rejected_total", "channel" => sensor.as_str())
                    .increment(1);
                Err(FusionError::InvalidSample(err))
            }
        }
    }

    /// Compute risks, alerts, and recommendations from current histories
    pub fn generate_assessment(&self) -> Assessment {
        let now = self.clock.now();
        let vision = lock(&self.vision).clone();
        let obd = lock(&self.obd).clone();
        let fatigue = lock(&self.fatigue).clone();
        let weights = self.weights.current();
        let policy = AlertPolicy::new(self.thresholds());

        let risks = risk::assess(&vision, &obd, &fatigue, &weights, now);
        let alerts = policy.evaluate(&risks);
        let recommendations = policy.recommend(&risks);
        let overall_safety_score = risks.overall_safety_score();

        metrics::gauge!("fusion_safety_score").set(overall_safety_score);
        metrics::counter!("fusion_alerts_total").increment(alerts.len() as u64);
        debug!(
            "Assessment: risks {:?}, {} alert(s), score {:.1}",
            risks,
            alerts.len(),
            overall_safety_score
        );

        Assessment {
            timestamp: now,
            risks,
            alerts,
            recommendations,
            overall_safety_score,
        }
    }

    /// Confidence-driven weight re-normalization
    pub fn adjust_weights(&self, confidence: &HashMap<Sensor, f64>) {
        self.weights.adjust(confidence);
    }

    pub fn weights(&self) -> FusionWeights {
        self.weights.current()
    }

    pub fn thresholds(&self) -> AlertThresholds {
        *self.thresholds.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace alert thresholds (configuration load)
    pub fn set_thresholds(&self, thresholds: AlertThresholds) -> Result<(), FusionError> {
        thresholds.validate()?;
        *self.thresholds.write().unwrap_or_else(PoisonError::into_inner) = thresholds;
        info!("Alert thresholds replaced: {:?}", thresholds);
        Ok(())
    }

    /// Apply weights and thresholds from reloaded settings
    pub fn apply_settings(&self, settings: &FusionSettings) -> Result<(), FusionError> {
        settings.validate()?;
        self.set_thresholds(settings.thresholds)?;
        self.weights.replace(settings.weights);
        Ok(())
    }

    pub fn summary(&self) -> EngineSummary {
        EngineSummary {
            vision_entries: lock(&self.vision).len(),
            obd_entries: lock(&self.obd).len(),
            fatigue_entries: lock(&self.fatigue).len(),
            last_update: self.clock.now(),
            weights: self.weights.current(),
        }
    }

    /// Copy of histories, weights, and thresholds
    pub fn snapshot(&self) -> FusionSnapshot {
        FusionSnapshot {
            vision_data: lock(&self.vision).to_vec(),
            obd_data: lock(&self.obd).to_vec(),
            fatigue_data: lock(&self.fatigue).to_vec(),
            weights: self.weights.current(),
            thresholds: self.thresholds(),
        }
    }

    /// Persist a snapshot; failure leaves engine state untouched
    pub fn export_snapshot(&self, path: impl AsRef<Path>) -> Result<(), FusionError> {
        let snapshot = self.snapshot();
        self.exporter.export(&snapshot, path)?;
        Ok(())
    }

    /// Persist one assessment
    pub fn save_assessment(
        &self,
        assessment: &Assessment,
        path: impl AsRef<Path>,
    ) -> Result<(), FusionError> {
        self.exporter.export(assessment, path)?;
        Ok(())
    }
}

impl Default for FusionEngine {
    fn default() -> Self {
        Self::from_settings(&FusionSettings::default())
    }
}

/// A poisoned history is still structurally valid
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use alerting::{AlertKind, Severity};
    use storage::SnapshotFormat;

    fn engine_at(start: f64) -> (FusionEngine, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(start));
        let engine = FusionEngine::default().with_clock(clock.clone());
        (engine, clock)
    }

    #[test]
    fn test_empty_assessment() {
        let (engine, _) = engine_at(1000.0);
        let assessment = engine.generate_assessment();

        assert_eq!(assessment.risks, RiskSet::default());
        assert!(assessment.alerts.is_empty());
        assert!(assessment.recommendations.is_empty());
        assert_eq!(assessment.overall_safety_score, 100.0);
        assert_eq!(assessment.timestamp, 1000.0);
    }

    #[test]
    fn test_collision_scenario_raises_alert() {
        let (engine, _) = engine_at(1000.0);
        engine
            .ingest_vision(VisionSample {
                collision_warning: true,
                object_count: 1,
                closest_object_distance: Some(5.0),
                ..Default::default()
            })
            .unwrap();
        engine
            .ingest_obd(BusSample {
                speed_kmh: 90.0,
                aggressive_acceleration: true,
                ..Default::default()
            })
            .unwrap();

        let assessment = engine.generate_assessment();
        assert!((assessment.risks.collision - 0.751).abs() < 1e-9);
        assert_eq!(assessment.alerts[0].kind, AlertKind::CollisionWarning);
        assert_eq!(assessment.alerts[0].severity, Severity::High);
        assert!(assessment
            .recommendations
            .contains(&"Increase following distance".to_string()));
        // A single flagged bus sample is a 100% aggressive share
        assert_eq!(assessment.risks.aggressive_driving, 1.0);
        assert_eq!(assessment.alerts.len(), 2);
        assert_eq!(assessment.alerts[1].kind, AlertKind::AggressiveDriving);
    }

    #[test]
    fn test_ingest_stamps_with_clock() {
        let (engine, clock) = engine_at(500.0);
        engine
            .ingest_fatigue(FatigueSample {
                timestamp: 3.0,
                ..Default::default()
            })
            .unwrap();
        clock.advance(1.0);
        engine.ingest_fatigue(FatigueSample::default()).unwrap();

        let stamps: Vec<f64> = engine.snapshot().fatigue_data.iter().map(|s| s.timestamp).collect();
        assert_eq!(stamps, vec![500.0, 501.0]);
    }

    #[test]
    fn test_invalid_sample_leaves_history_intact() {
        let (engine, _) = engine_at(10.0);
        engine.ingest_vision(VisionSample::default()).unwrap();

        let err = engine
            .ingest_vision(VisionSample {
                confidence: 2.0,
                ..Default::default()
            })
            .unwrap_err();

        assert!(matches!(
            err,
            FusionError::InvalidSample(ValidationError::OutOfRange { field: "confidence", .. })
        ));
        assert_eq!(engine.summary().vision_entries, 1);
    }

    #[test]
    fn test_negative_clock_rejected() {
        let (engine, _) = engine_at(-5.0);
        let err = engine.ingest_obd(BusSample::default()).unwrap_err();
        assert!(matches!(err, FusionError::InvalidSample(e) if e.field() == "timestamp"));
        assert_eq!(engine.summary().obd_entries, 0);
    }

    #[test]
    fn test_configured_validation_ranges() {
        let mut settings = FusionSettings::default();
        settings.validation.speed_range = (0.0, 200.0);
        let engine = FusionEngine::new(&settings)
            .unwrap()
            .with_clock(Arc::new(ManualClock::new(10.0)));

        let fast = BusSample {
            speed_kmh: 250.0,
            ..Default::default()
        };
        let err = engine.ingest_obd(fast.clone()).unwrap_err();
        assert!(matches!(err, FusionError::InvalidSample(e) if e.field() == "speed_kmh"));

        // Accepted under the default 400 km/h ceiling
        assert!(FusionEngine::default().ingest_obd(fast).is_ok());
    }

    #[test]
    fn test_lane_departure_window_uses_clock() {
        let (engine, clock) = engine_at(100.0);
        for _ in 0..2 {
            engine
                .ingest_vision(VisionSample {
                    lane_departure: true,
                    ..Default::default()
                })
                .unwrap();
        }
        assert_eq!(engine.generate_assessment().risks.lane_departure, 1.0);

        clock.advance(6.0);
        assert_eq!(engine.generate_assessment().risks.lane_departure, 0.0);
    }

    #[test]
    fn test_live_weights_used_for_collision() {
        let (engine, _) = engine_at(100.0);
        engine
            .ingest_vision(VisionSample {
                collision_warning: true,
                ..Default::default()
            })
            .unwrap();
        assert!((engine.generate_assessment().risks.collision - 0.4).abs() < 1e-9);

        engine.adjust_weights(&HashMap::from([
            (Sensor::Vision, 1.0),
            (Sensor::Obd, 0.0),
            (Sensor::Fatigue, 0.0),
        ]));
        assert!((engine.generate_assessment().risks.collision - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_set_thresholds_validates() {
        let engine = FusionEngine::default();
        let bad = AlertThresholds {
            lane_departure: -0.1,
            ..Default::default()
        };
        assert!(matches!(engine.set_thresholds(bad), Err(FusionError::Config(_))));
        assert_eq!(engine.thresholds(), AlertThresholds::default());
    }

    #[test]
    fn test_summary_counts() {
        let (engine, _) = engine_at(1.0);
        engine.ingest_vision(VisionSample::default()).unwrap();
        engine.ingest_obd(BusSample::default()).unwrap();
        engine.ingest_obd(BusSample::default()).unwrap();

        let summary = engine.summary();
        assert_eq!(summary.vision_entries, 1);
        assert_eq!(summary.obd_entries, 2);
        assert_eq!(summary.fatigue_entries, 0);
        assert_eq!(summary.weights, FusionWeights::default());
    }

    #[test]
    fn test_export_snapshot_field_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fusion.json");
        let (engine, _) = engine_at(42.0);
        engine.ingest_vision(VisionSample::default()).unwrap();

        engine.export_snapshot(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&text).unwrap();
        for key in ["vision_data", "obd_data", "fatigue_data", "weights", "thresholds"] {
            assert!(doc.get(key).is_some(), "missing {}", key);
        }
        assert_eq!(doc["vision_data"][0]["timestamp"], 42.0);
        assert_eq!(doc["weights"]["vision"], 0.5);
        assert_eq!(doc["thresholds"]["collision_risk"], 0.7);
    }

    #[test]
    fn test_export_failure_keeps_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("fusion.json");
        let (engine, _) = engine_at(1.0);
        engine.ingest_obd(BusSample::default()).unwrap();

        let err = engine.export_snapshot(&path).unwrap_err();
        assert!(matches!(err, FusionError::Persistence(_)));
        assert_eq!(engine.summary().obd_entries, 1);
    }

    #[test]
    fn test_postcard_export_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fusion.bin");
        let mut settings = FusionSettings::default();
        settings.export.format = SnapshotFormat::Postcard;
        let engine = FusionEngine::new(&settings)
            .unwrap()
            .with_clock(Arc::new(ManualClock::new(7.0)));
        engine
            .ingest_vision(VisionSample {
                closest_object_distance: Some(12.0),
                ..Default::default()
            })
            .unwrap();

        engine.export_snapshot(&path).unwrap();
        let loaded: FusionSnapshot = SnapshotExporter::new(SnapshotFormat::Postcard)
            .load(&path)
            .unwrap();
        assert_eq!(loaded, engine.snapshot());
    }

    #[test]
    fn test_save_assessment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("assessment.json");
        let engine = FusionEngine::default();

        engine.save_assessment(&engine.generate_assessment(), &path).unwrap();

        let doc: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(doc["overall_safety_score"], 100.0);
        assert!(doc["alerts"].as_array().unwrap().is_empty());
    }
}
