pub mod pipeline;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::config::RiskThresholds;

/// Raw survey answers, keyed by item code. Likert items carry integers 1-5,
/// demographic codes carry small non-negative enumeration values. Values stay
/// as JSON until a validation boundary coerces them.
pub type RawResponse = BTreeMap<String, Value>;

/// Scale name to score in [1, 5], or 0.0 when no items of the scale were
/// answered.
pub type ScoreMap = BTreeMap<String, f64>;

/// A session lifecycle event feeding the pipeline.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// The respondent finished the survey.
    Completed {
        session_id: String,
        responses: RawResponse,
    },
    /// The result view was re-rendered for an already-completed session.
    ResultViewed { session_id: String },
}

/// Parsed reply from the model-serving endpoint. `probability` is absent when
/// a legacy model returns only a bare class label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelOutput {
    pub prediction: i64,
    pub probability: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_probability(probability: f64, thresholds: &RiskThresholds) -> Self {
        if probability >= thresholds.high {
            RiskLevel::High
        } else if probability >= thresholds.medium {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            RiskLevel::Low => "🟢",
            RiskLevel::Medium => "🟡",
            RiskLevel::High => "🔴",
        }
    }
}

/// A finished assessment ready for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentOutcome {
    pub session_id: String,
    pub scores: ScoreMap,
    pub probability: f64,
    pub risk_level: RiskLevel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_level_thresholds() {
        let thresholds = RiskThresholds::default();
        assert_eq!(
            RiskLevel::from_probability(0.10, &thresholds),
            RiskLevel::Low
        );
        assert_eq!(
            RiskLevel::from_probability(0.33, &thresholds),
            RiskLevel::Medium
        );
        assert_eq!(
            RiskLevel::from_probability(0.39, &thresholds),
            RiskLevel::Medium
        );
        assert_eq!(
            RiskLevel::from_probability(0.40, &thresholds),
            RiskLevel::High
        );
    }

    #[test]
    fn risk_level_for_elevated_probability() {
        // probability 0.42 classifies as HIGH under default thresholds
        let thresholds = RiskThresholds::default();
        assert_eq!(
            RiskLevel::from_probability(0.42, &thresholds),
            RiskLevel::High
        );
    }

    #[test]
    fn custom_thresholds_move_the_boundaries() {
        let thresholds = RiskThresholds {
            medium: 0.5,
            high: 0.8,
        };
        assert_eq!(
            RiskLevel::from_probability(0.42, &thresholds),
            RiskLevel::Low
        );
        assert_eq!(
            RiskLevel::from_probability(0.79, &thresholds),
            RiskLevel::Medium
        );
    }
}
