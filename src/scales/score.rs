use crate::core::RawResponse;

use super::ScaleDefinition;
use super::alias::split_item_code;

pub const LIKERT_MIN: f64 = 1.0;
pub const LIKERT_MAX: f64 = 5.0;

/// Invert a reverse-coded Likert answer: `6 - v` on the 1-5 scale.
/// Involutive: applying it twice returns the original value.
pub fn invert_likert(value: f64) -> f64 {
    LIKERT_MAX + LIKERT_MIN - value
}

/// Look up an item by canonical padded code, falling back to the unpadded
/// form (`EX01` then `EX1`). Non-numeric values count as absent.
fn lookup_item(responses: &RawResponse, code: &str) -> Option<f64> {
    if let Some(value) = responses.get(code).and_then(|v| v.as_f64()) {
        return Some(value);
    }
    let (prefix, index) = split_item_code(code)?;
    responses
        .get(&format!("{prefix}{index}"))
        .and_then(|v| v.as_f64())
}

/// Score one scale: mean of the (possibly reverse-transformed) answered
/// items, or 0.0 when no item of the scale was answered. Pure and tolerant
/// of missing items, so an instrument revision that drops a scale never
/// aborts scoring of the rest of the assessment.
pub fn score_scale(responses: &RawResponse, definition: &ScaleDefinition) -> f64 {
    let mut sum = 0.0;
    let mut found = 0usize;
    for item in &definition.items {
        let Some(value) = lookup_item(responses, &item.code) else {
            continue;
        };
        sum += if item.reverse {
            invert_likert(value)
        } else {
            value
        };
        found += 1;
    }
    if found == 0 { 0.0 } else { sum / found as f64 }
}
