use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::core::{ModelOutput, RawResponse, RiskLevel, ScoreMap};
use crate::error::PipelineError;

/// Canonical prefix families of Likert item codes; values under these
/// prefixes must lie in [1, 5].
pub const LIKERT_PREFIXES: &[&str] = &[
    "EX", "AM", "CO", "NE", "AE", "ER", "AW", "PR", "CP", "SU", "FE", "FC", "DS",
];

const DEMO_PREFIX: &str = "Demo_";

/// The full persistable unit for one completed assessment. Immutable once
/// built; owned by the durable writer until the write completes or
/// permanently fails.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRecord {
    pub response_id: String,
    pub timestamp: DateTime<Utc>,
    pub responses: RawResponse,
    pub scores: ScoreMap,
    pub probability: f64,
    pub risk_level: RiskLevel,
}

/// Merge responses, scores, and model output into one persistable record,
/// injecting a fresh identifier and timestamp.
///
/// A model output without a probability is an unrecoverable upstream defect
/// (`InvalidModelOutput`), not something to default away. Range violations
/// (`RangeValidation`) guard against corrupted UI state reaching durable
/// storage.
pub fn build_record(
    responses: RawResponse,
    scores: ScoreMap,
    output: &ModelOutput,
    risk_level: RiskLevel,
) -> Result<ResultRecord, PipelineError> {
    let probability = output.probability.ok_or_else(|| {
        PipelineError::InvalidModelOutput("model output has no probability".into())
    })?;
    validate_ranges(&responses)?;
    Ok(ResultRecord {
        response_id: Uuid::new_v4().to_string(),
        timestamp: Utc::now(),
        responses,
        scores,
        probability,
        risk_level,
    })
}

fn is_likert_key(key: &str) -> bool {
    LIKERT_PREFIXES.iter().any(|prefix| key.starts_with(prefix))
}

fn numeric(field: &str, value: &Value) -> Result<f64, PipelineError> {
    value.as_f64().ok_or_else(|| PipelineError::TypeCoercion {
        field: field.to_string(),
        value: value.to_string(),
        expected: "number",
    })
}

fn validate_ranges(responses: &RawResponse) -> Result<(), PipelineError> {
    for (key, value) in responses {
        if key.starts_with(DEMO_PREFIX) {
            let v = numeric(key, value)?;
            if v < 0.0 {
                return Err(PipelineError::RangeValidation {
                    field: key.clone(),
                    value: v,
                });
            }
        } else if is_likert_key(key) {
            let v = numeric(key, value)?;
            if !(1.0..=5.0).contains(&v) {
                return Err(PipelineError::RangeValidation {
                    field: key.clone(),
                    value: v,
                });
            }
        }
    }
    Ok(())
}
