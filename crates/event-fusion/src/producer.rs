//! Producer-side adapters
//!
//! External pipelines (object/lane detection, bus reader, driver monitor)
//! report raw results through the capability traits below. The adapters
//! turn those results into fusion samples and keep any cross-call state
//! (previous bus reading, blink and yawn counters) on the producer side.

use crate::sample::{BusSample, FatigueSample, VisionSample};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::debug;

/// One object reported by the detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedObject {
    pub label: String,
    /// Estimated distance in meters, if the detector could estimate it
    pub distance_m: Option<f64>,
    pub confidence: f64,
}

/// Road-scene detection result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionSummary {
    pub lane_departure_warning: bool,
    pub collision_warning: bool,
    pub objects: Vec<DetectedObject>,
    pub confidence: f64,
}

impl DetectionSummary {
    /// Nearest object with a known finite distance
    pub fn closest_distance(&self) -> Option<f64> {
        self.objects
            .iter()
            .filter_map(|o| o.distance_m)
            .filter(|d| d.is_finite())
            .min_by(|a, b| a.total_cmp(b))
    }
}

impl From<&DetectionSummary> for VisionSample {
    fn from(summary: &DetectionSummary) -> Self {
        Self {
            timestamp: 0.0,
            lane_departure: summary.lane_departure_warning,
            collision_warning: summary.collision_warning,
            object_count: summary.objects.len() as u32,
            closest_object_distance: summary.closest_distance(),
            confidence: summary.confidence,
        }
    }
}

/// Vision capability: `detects(frame) -> DetectionSummary`
pub trait VisionDetector {
    type Frame;

    fn detects(&mut self, frame: &Self::Frame) -> DetectionSummary;
}

/// Raw vehicle-bus channel values
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BusReading {
    /// Read time (seconds since UNIX epoch)
    pub timestamp: f64,
    pub speed_kmh: f64,
    pub rpm: f64,
    pub throttle_pct: f64,
}

/// Driving behavior flags derived from bus readings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BehaviorFlags {
    pub aggressive_acceleration: bool,
    pub aggressive_braking: bool,
    pub excessive_speed: bool,
    pub engine_stress: bool,
}

/// Fixed numeric rules for behavior flags
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehaviorRules {
    /// Throttle above which acceleration is aggressive (%)
    pub aggressive_throttle_pct: f64,
    /// Minimum speed for the throttle rule (km/h)
    pub aggressive_min_speed_kmh: f64,
    /// RPM above which the engine is stressed
    pub engine_stress_rpm: f64,
    /// Speed above which driving is excessive (km/h)
    pub excessive_speed_kmh: f64,
    /// Deceleration above which braking is aggressive (km/h per second, ~0.4 g)
    pub hard_brake_kmh_per_s: f64,
}

impl Default for BehaviorRules {
    fn default() -> Self {
        Self {
            aggressive_throttle_pct: 80.0,
            aggressive_min_speed_kmh: 20.0,
            engine_stress_rpm: 4000.0,
            excessive_speed_kmh: 120.0,
            hard_brake_kmh_per_s: 15.0,
        }
    }
}

impl BehaviorRules {
    /// Derive flags from the current reading and, for braking, the previous one
    pub fn derive(&self, reading: &BusReading, previous: Option<&BusReading>) -> BehaviorFlags {
        let aggressive_braking = previous
            .map(|prev| {
                let dt = reading.timestamp - prev.timestamp;
                dt > 0.0 && (prev.speed_kmh - reading.speed_kmh) / dt > self.hard_brake_kmh_per_s
            })
            .unwrap_or(false);

        BehaviorFlags {
            aggressive_acceleration: reading.throttle_pct > self.aggressive_throttle_pct
                && reading.speed_kmh > self.aggressive_min_speed_kmh,
            aggressive_braking,
            excessive_speed: reading.speed_kmh > self.excessive_speed_kmh,
            engine_stress: reading.rpm > self.engine_stress_rpm,
        }
    }
}

impl BusSample {
    /// Combine raw readings with derived flags
    pub fn from_reading(reading: &BusReading, flags: BehaviorFlags) -> Self {
        Self {
            timestamp: reading.timestamp,
            speed_kmh: reading.speed_kmh,
            rpm: reading.rpm,
            throttle_pct: reading.throttle_pct,
            aggressive_acceleration: flags.aggressive_acceleration,
            aggressive_braking: flags.aggressive_braking,
            excessive_speed: flags.excessive_speed,
            engine_stress: flags.engine_stress,
        }
    }
}

/// Vehicle-bus capability: `reads() -> BusReading`
#[cfg_attr(test, mockall::automock)]
pub trait BusReader {
    /// Latest reading, `None` when no new data is available
    fn reads(&mut self) -> Option<BusReading>;
}

/// Polls a bus reader and derives behavior flags across readings
pub struct BusProducer<R: BusReader> {
    reader: R,
    rules: BehaviorRules,
    previous: Option<BusReading>,
}

impl<R: BusReader> BusProducer<R> {
    pub fn new(reader: R, rules: BehaviorRules) -> Self {
        Self {
            reader,
            rules,
            previous: None,
        }
    }

    /// Next sample, or `None` if the reader has nothing new
    pub fn poll(&mut self) -> Option<BusSample> {
        let reading = self.reader.reads()?;
        let flags = self.rules.derive(&reading, self.previous.as_ref());
        self.previous = Some(reading);
        Some(BusSample::from_reading(&reading, flags))
    }
}

/// Facial measurements for one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceMetrics {
    pub eye_aspect_ratio: f64,
    pub mouth_aspect_ratio: f64,
    pub confidence: f64,
}

/// Driver-monitor capability: facial metrics per frame
pub trait DriverMonitor {
    type Frame;

    /// `None` when no face is visible
    fn analyze(&mut self, frame: &Self::Frame) -> Option<FaceMetrics>;
}

/// Eye aspect ratio below which the eye counts as closed
pub const EAR_THRESHOLD: f64 = 0.25;
/// Closed frames required before a reopen counts as a blink
pub const EAR_CONSEC_FRAMES: u32 = 20;
/// Mouth aspect ratio above which the mouth counts as open
pub const MAR_THRESHOLD: f64 = 0.6;
/// Open-mouth frames that make a sustained yawn
pub const YAWN_CONSEC_FRAMES: u32 = 10;

/// Producer-local blink/yawn tracking and fatigue scoring
#[derive(Debug, Clone)]
pub struct FatigueScorer {
    session_start: f64,
    eye_counter: u32,
    yawn_counter: u32,
    total_blinks: u64,
    /// Blink times within the last minute
    blink_times: VecDeque<f64>,
}

impl FatigueScorer {
    pub fn new(session_start: f64) -> Self {
        Self {
            session_start,
            eye_counter: 0,
            yawn_counter: 0,
            total_blinks: 0,
            blink_times: VecDeque::new(),
        }
    }

    pub fn total_blinks(&self) -> u64 {
        self.total_blinks
    }

    /// Update counters with one frame's metrics and build a sample
    pub fn observe(&mut self, metrics: &FaceMetrics, now: f64) -> FatigueSample {
        let mut blink_detected = false;
        if metrics.eye_aspect_ratio < EAR_THRESHOLD {
            self.eye_counter += 1;
        } else {
            if self.eye_counter >= EAR_CONSEC_FRAMES {
                self.total_blinks += 1;
                self.blink_times.push_back(now);
                blink_detected = true;
            }
            self.eye_counter = 0;
        }

        let mut yawn_detected = false;
        if metrics.mouth_aspect_ratio > MAR_THRESHOLD {
            self.yawn_counter += 1;
            yawn_detected = self.yawn_counter >= YAWN_CONSEC_FRAMES;
        } else {
            self.yawn_counter = 0;
        }

        let fatigue_score = self.score(now);
        debug!(
            "Fatigue score {:.1} (blink: {}, yawn: {})",
            fatigue_score, blink_detected, yawn_detected
        );

        FatigueSample {
            timestamp: now,
            fatigue_score,
            blink_detected,
            yawn_detected,
            eye_aspect_ratio: metrics.eye_aspect_ratio.clamp(0.0, 1.0),
            confidence: metrics.confidence,
        }
    }

    /// Blink-rate, yawn, and session-time score, capped at 100
    fn score(&mut self, now: f64) -> f64 {
        while self.blink_times.front().is_some_and(|&t| now - t > 60.0) {
            self.blink_times.pop_front();
        }

        // Normal rate is 15-20 blinks per minute
        let rate = self.blink_times.len() as f64;
        let blink_score = if rate < 10.0 {
            (10.0 - rate) / 10.0 * 50.0
        } else if rate > 30.0 {
            (rate - 30.0) / 10.0 * 30.0
        } else {
            0.0
        };

        let yawn_score = f64::from(self.yawn_counter) * 10.0;
        let hours = (now - self.session_start).max(0.0) / 3600.0;
        let time_score = (hours * 20.0).min(40.0);

        (blink_score + yawn_score + time_score).min(100.0)
    }
}

/// Runs a driver monitor through a fatigue scorer
pub struct FatigueProducer<M: DriverMonitor> {
    monitor: M,
    scorer: FatigueScorer,
}

impl<M: DriverMonitor> FatigueProducer<M> {
    pub fn new(monitor: M, session_start: f64) -> Self {
        Self {
            monitor,
            scorer: FatigueScorer::new(session_start),
        }
    }

    pub fn process(&mut self, frame: &M::Frame, now: f64) -> Option<FatigueSample> {
        let metrics = self.monitor.analyze(frame)?;
        Some(self.scorer.observe(&metrics, now))
    }
}

/// Runs a vision detector and converts its summary
pub struct VisionProducer<D: VisionDetector> {
    detector: D,
}

impl<D: VisionDetector> VisionProducer<D> {
    pub fn new(detector: D) -> Self {
        Self { detector }
    }

    pub fn process(&mut self, frame: &D::Frame) -> VisionSample {
        VisionSample::from(&self.detector.detects(frame))
    }
}
