//! Risk model
//!
//! Side-effect-free scoring functions. Each returns a risk in [0, 1] and
//! degrades to 0 when the histories it reads are empty.

use crate::sample::{BusSample, FatigueSample, VisionSample};
use crate::weights::FusionWeights;
use alerting::RiskSet;
use bounded_history::BoundedHistory;

/// Trailing window for lane departure counting (seconds)
pub const LANE_WINDOW_SECONDS: f64 = 5.0;
/// Distance below which an object adds collision risk (meters)
pub const COLLISION_DISTANCE_M: f64 = 20.0;
/// Speed above which collision risk grows (km/h)
pub const COLLISION_SPEED_KMH: f64 = 60.0;
/// Yawns across the history above which fatigue risk is boosted
pub const YAWN_BOOST_COUNT: usize = 2;

/// Compute all four risks from point-in-time channel copies
pub fn assess(
    vision: &BoundedHistory<VisionSample>,
    obd: &BoundedHistory<BusSample>,
    fatigue: &BoundedHistory<FatigueSample>,
    weights: &FusionWeights,
    now: f64,
) -> RiskSet {
    RiskSet {
        collision: collision_risk(vision, obd, weights),
        lane_departure: lane_departure_risk(vision, now),
        driver_fatigue: driver_fatigue_risk(fatigue),
        aggressive_driving: aggressive_driving_risk(obd),
    }
}

/// Weighted collision risk from the latest vision and bus samples
pub fn collision_risk(
    vision: &BoundedHistory<VisionSample>,
    obd: &BoundedHistory<BusSample>,
    weights: &FusionWeights,
) -> f64 {
    let vision_risk = vision.latest().map(vision_collision_risk).unwrap_or(0.0);
    let obd_risk = obd.latest().map(bus_collision_risk).unwrap_or(0.0);

    (vision_risk * weights.vision + obd_risk * weights.obd).clamp(0.0, 1.0)
}

/// Unweighted vision contribution: warning flag plus proximity
fn vision_collision_risk(sample: &VisionSample) -> f64 {
    let mut risk = 0.0;
    if sample.collision_warning {
        risk += 0.8;
    }
    if let Some(distance) = sample.closest_object_distance {
        risk += (1.0 - distance / COLLISION_DISTANCE_M).max(0.0) * 0.6;
    }
    risk
}

/// Unweighted bus contribution: speed plus harsh inputs
fn bus_collision_risk(sample: &BusSample) -> f64 {
    let mut risk = 0.0;
    if sample.speed_kmh > COLLISION_SPEED_KMH {
        risk += (sample.speed_kmh - COLLISION_SPEED_KMH) / 100.0 * 0.4;
    }
    if sample.aggressive_acceleration || sample.aggressive_braking {
        risk += 0.3;
    }
    risk
}

/// Recent departures over the whole buffer length.
///
/// The denominator is the buffer length, not the windowed count.
pub fn lane_departure_risk(vision: &BoundedHistory<VisionSample>, now: f64) -> f64 {
    if vision.is_empty() {
        return 0.0;
    }

    let departures = vision
        .within_window(now, LANE_WINDOW_SECONDS)
        .filter(|s| s.lane_departure)
        .count();

    (departures as f64 / vision.len() as f64).min(1.0)
}

/// Latest fatigue score, boosted by repeated yawning
pub fn driver_fatigue_risk(fatigue: &BoundedHistory<FatigueSample>) -> f64 {
    let Some(latest) = fatigue.latest() else {
        return 0.0;
    };

    let mut risk = latest.fatigue_score / 100.0;
    let yawns = fatigue.iter().filter(|s| s.yawn_detected).count();
    if yawns > YAWN_BOOST_COUNT {
        risk += 0.2;
    }
    risk.clamp(0.0, 1.0)
}

/// Share of buffered bus samples with any aggressive flag
pub fn aggressive_driving_risk(obd: &BoundedHistory<BusSample>) -> f64 {
    if obd.is_empty() {
        return 0.0;
    }

    let aggressive = obd.iter().filter(|s| s.is_aggressive()).count();
    aggressive as f64 / obd.len() as f64
}
