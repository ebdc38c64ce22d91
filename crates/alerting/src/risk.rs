//! Per-domain risk scores

use serde::{Deserialize, Serialize};

/// Risk per domain, each in [0, 1]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskSet {
    pub collision: f64,
    pub lane_departure: f64,
    pub driver_fatigue: f64,
    pub aggressive_driving: f64,
}

impl RiskSet {
    /// Composite safety score in [0, 100], 100 meaning no risk
    pub fn overall_safety_score(&self) -> f64 {
        let weighted = self.collision * 0.4
            + self.lane_departure * 0.2
            + self.driver_fatigue * 0.3
            + self.aggressive_driving * 0.1;

        (100.0 - weighted * 100.0).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_risk_scores_100() {
        assert_eq!(RiskSet::default().overall_safety_score(), 100.0);
    }

    #[test]
    fn test_full_risk_scores_0() {
        let risks = RiskSet {
            collision: 1.0,
            lane_departure: 1.0,
            driver_fatigue: 1.0,
            aggressive_driving: 1.0,
        };
        assert!(risks.overall_safety_score().abs() < 1e-9);
    }

    #[test]
    fn test_weighted_score() {
        let risks = RiskSet {
            collision: 0.5,
            driver_fatigue: 0.5,
            ..Default::default()
        };
        // 100 - 100 * (0.2 + 0.15)
        assert!((risks.overall_safety_score() - 65.0).abs() < 1e-9);
    }
}
