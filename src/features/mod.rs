use serde_json::{Value, json};

use crate::core::{RawResponse, ScoreMap};
use crate::error::PipelineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureKind {
    Int,
    Float,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValue {
    Int(i64),
    Float(f64),
}

/// The input schema of the deployed model-serving endpoint, in wire order.
/// Integer fields are demographic codes read from the responses; float fields
/// are scale scores. The vector sent out must contain exactly these fields —
/// a versioned serving contract rejects (or misreads) extras and omissions
/// alike.
pub const FEATURE_CONTRACT: &[(&str, FeatureKind)] = &[
    ("Demo_Rol_Trabajo", FeatureKind::Int),
    ("Demo_Horas", FeatureKind::Int),
    ("Demo_Tamano_Org", FeatureKind::Int),
    ("Fatiga_Global_Score", FeatureKind::Float),
    ("Big5_Apertura", FeatureKind::Float),
    ("Phish_Riesgo_Percibido", FeatureKind::Float),
];

/// An assembled feature vector matching `FEATURE_CONTRACT` field for field.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    fields: Vec<(&'static str, FeatureValue)>,
}

impl FeatureVector {
    pub fn columns(&self) -> Vec<&'static str> {
        self.fields.iter().map(|(name, _)| *name).collect()
    }

    /// Values in contract order, as a JSON row for the wire payload.
    pub fn row(&self) -> Vec<Value> {
        self.fields
            .iter()
            .map(|(_, value)| match value {
                FeatureValue::Int(v) => json!(v),
                FeatureValue::Float(v) => json!(v),
            })
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        self.fields
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Build the feature vector for the prediction call.
///
/// Demographic fields are a hard validation boundary: an absent field fails
/// with `MissingField` naming it, before any external call is made, and a
/// present but non-numeric value fails with `TypeCoercion`. Score fields
/// default to 0.0 when absent, a defensive fallback only — the aggregator
/// guarantees a numeric value per registered scale.
pub fn assemble(scores: &ScoreMap, responses: &RawResponse) -> Result<FeatureVector, PipelineError> {
    let mut fields = Vec::with_capacity(FEATURE_CONTRACT.len());
    for (name, kind) in FEATURE_CONTRACT {
        let value = match kind {
            FeatureKind::Int => {
                let raw = responses
                    .get(*name)
                    .ok_or_else(|| PipelineError::MissingField(name.to_string()))?;
                FeatureValue::Int(coerce_int(name, raw)?)
            }
            FeatureKind::Float => FeatureValue::Float(scores.get(*name).copied().unwrap_or(0.0)),
        };
        fields.push((*name, value));
    }
    Ok(FeatureVector { fields })
}

/// Coerce a JSON answer to an integer. Floats truncate, numeric strings
/// parse; anything else is a corruption signal.
fn coerce_int(field: &str, value: &Value) -> Result<i64, PipelineError> {
    if let Some(v) = value.as_i64() {
        return Ok(v);
    }
    if let Some(v) = value.as_f64() {
        return Ok(v as i64);
    }
    if let Some(s) = value.as_str() {
        if let Ok(v) = s.trim().parse::<i64>() {
            return Ok(v);
        }
    }
    Err(PipelineError::TypeCoercion {
        field: field.to_string(),
        value: value.to_string(),
        expected: "integer",
    })
}
