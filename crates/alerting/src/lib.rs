//! Alerting
//!
//! Maps per-domain risk scores to alerts and recommendations, and computes
//! the composite safety score.

mod policy;
mod risk;

pub use policy::{Alert, AlertKind, AlertPolicy, AlertThresholds, Severity, ThresholdError};
pub use risk::RiskSet;
