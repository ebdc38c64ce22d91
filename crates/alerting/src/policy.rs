//! Alert Policy Implementation

use crate::RiskSet;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Collision risk above which following distance should grow
const RECOMMEND_COLLISION: f64 = 0.3;
/// Fatigue risk above which a break is recommended
const RECOMMEND_FATIGUE: f64 = 0.5;
/// Aggressive-driving risk above which calmer driving is recommended
const RECOMMEND_AGGRESSIVE: f64 = 0.4;

/// Invalid threshold configuration
#[derive(Debug, Clone, PartialEq, Error)]
#[error("threshold {name} = {value} must be within [0, 1]")]
pub struct ThresholdError {
    pub name: &'static str,
    pub value: f64,
}

/// Alert thresholds per risk domain
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertThresholds {
    /// Collision risk threshold (default: 0.7)
    pub collision_risk: f64,
    /// Lane departure threshold (default: 0.6)
    pub lane_departure: f64,
    /// Driver fatigue threshold (default: 0.8)
    pub driver_fatigue: f64,
    /// Aggressive driving threshold (default: 0.7)
    pub aggressive_driving: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            collision_risk: 0.7,
            lane_departure: 0.6,
            driver_fatigue: 0.8,
            aggressive_driving: 0.7,
        }
    }
}

impl AlertThresholds {
    /// Check every threshold is a finite value in [0, 1]
    pub fn validate(&self) -> Result<(), ThresholdError> {
        let fields = [
            ("collision_risk", self.collision_risk),
            ("lane_departure", self.lane_departure),
            ("driver_fatigue", self.driver_fatigue),
            ("aggressive_driving", self.aggressive_driving),
        ];

        for (name, value) in fields {
            if !(0.0..=1.0).contains(&value) {
                return Err(ThresholdError { name, value });
            }
        }
        Ok(())
    }
}

/// Alert severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Medium,
    High,
}

/// Alert type, one per risk domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertKind {
    CollisionWarning,
    LaneDeparture,
    FatigueWarning,
    AggressiveDriving,
}

impl AlertKind {
    /// Wire name of the alert type
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::CollisionWarning => "COLLISION_WARNING",
            AlertKind::LaneDeparture => "LANE_DEPARTURE",
            AlertKind::FatigueWarning => "FATIGUE_WARNING",
            AlertKind::AggressiveDriving => "AGGRESSIVE_DRIVING",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            AlertKind::CollisionWarning | AlertKind::FatigueWarning => Severity::High,
            AlertKind::LaneDeparture | AlertKind::AggressiveDriving => Severity::Medium,
        }
    }

    /// Driver-facing message
    pub fn message(&self) -> &'static str {
        match self {
            AlertKind::CollisionWarning => "Collision risk detected! Maintain safe distance.",
            AlertKind::LaneDeparture => "Lane departure detected. Return to lane.",
            AlertKind::FatigueWarning => "Driver fatigue detected. Take a break.",
            AlertKind::AggressiveDriving => "Aggressive driving detected. Drive more calmly.",
        }
    }
}

/// A raised alert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub severity: Severity,
    pub message: String,
}

impl From<AlertKind> for Alert {
    fn from(kind: AlertKind) -> Self {
        Self {
            kind,
            severity: kind.severity(),
            message: kind.message().to_string(),
        }
    }
}

/// Threshold-based alert and recommendation policy
#[derive(Debug, Clone, Copy, Default)]
pub struct AlertPolicy {
    thresholds: AlertThresholds,
}

impl AlertPolicy {
    pub fn new(thresholds: AlertThresholds) -> Self {
        Self { thresholds }
    }

    /// Alerts for every risk strictly above its threshold.
    ///
    /// Order is fixed: collision, lane departure, fatigue, aggressive driving.
    pub fn evaluate(&self, risks: &RiskSet) -> Vec<Alert> {
        let checks = [
            (risks.collision, self.thresholds.collision_risk, AlertKind::CollisionWarning),
            (risks.lane_departure, self.thresholds.lane_departure, AlertKind::LaneDeparture),
            (risks.driver_fatigue, self.thresholds.driver_fatigue, AlertKind::FatigueWarning),
            (risks.aggressive_driving, self.thresholds.aggressive_driving, AlertKind::AggressiveDriving),
        ];

        let alerts: Vec<Alert> = checks
            .into_iter()
            .filter(|(risk, threshold, _)| risk > threshold)
            .map(|(_, _, kind)| Alert::from(kind))
            .collect();

        for alert in &alerts {
            info!("Alert raised: {} ({:?})", alert.kind.as_str(), alert.severity);
        }
        alerts
    }

    /// Recommendations from risk magnitude.
    ///
    /// These cut-offs are independent of the alert thresholds.
    pub fn recommend(&self, risks: &RiskSet) -> Vec<String> {
        let mut recommendations = Vec::new();

        if risks.collision > RECOMMEND_COLLISION {
            recommendations.push("Increase following distance".to_string());
        }
        if risks.driver_fatigue > RECOMMEND_FATIGUE {
            recommendations.push("Consider taking a break".to_string());
        }
        if risks.aggressive_driving > RECOMMEND_AGGRESSIVE {
            recommendations.push("Reduce acceleration and maintain steady speed".to_string());
        }

        debug!("{} recommendation(s)", recommendations.len());
        recommendations
    }
}
