pub mod alias;
pub mod score;

use crate::core::{RawResponse, ScoreMap};

/// One survey item within a scale: canonical zero-padded code plus whether
/// the answer must be inverted before entering the scale mean.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleItem {
    pub code: String,
    pub reverse: bool,
}

/// An ordered list of item codes making up one psychometric scale.
/// Immutable, defined at build time.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleDefinition {
    pub name: &'static str,
    pub items: Vec<ScaleItem>,
}

impl ScaleDefinition {
    /// A scale of `count` items `<prefix>01..<prefix>NN`; `reverse_items`
    /// lists the 1-based indices of reverse-coded items.
    fn likert(name: &'static str, prefix: &str, count: u32, reverse_items: &[u32]) -> Self {
        let items = (1..=count)
            .map(|i| ScaleItem {
                code: format!("{prefix}{i:02}"),
                reverse: reverse_items.contains(&i),
            })
            .collect();
        Self { name, items }
    }

    /// A composite scale concatenating several sub-scale item lists.
    fn composite(name: &'static str, parts: &[(&str, u32)]) -> Self {
        let items = parts
            .iter()
            .flat_map(|(prefix, count)| {
                (1..=*count).map(move |i| ScaleItem {
                    code: format!("{prefix}{i:02}"),
                    reverse: false,
                })
            })
            .collect();
        Self { name, items }
    }
}

/// The fixed scale registry: five Big Five scales, five phishing scales, and
/// the composite digital-fatigue scale. Scale names are the storage/model
/// contract names and must not drift.
pub struct ScaleSet {
    scales: Vec<ScaleDefinition>,
}

impl ScaleSet {
    pub fn new() -> Self {
        Self {
            scales: vec![
                ScaleDefinition::likert("Big5_Extraversion", "EX", 10, &[6, 7, 8, 9, 10]),
                ScaleDefinition::likert("Big5_Amabilidad", "AM", 10, &[6, 7, 8, 9, 10]),
                ScaleDefinition::likert("Big5_Responsabilidad", "CO", 10, &[7, 9]),
                ScaleDefinition::likert("Big5_Neuroticismo", "NE", 10, &[6, 7, 8, 9, 10]),
                ScaleDefinition::likert("Big5_Apertura", "AE", 10, &[6, 7, 8, 9, 10]),
                ScaleDefinition::likert("Phish_Actitud_Riesgo", "ER", 10, &[1, 2, 3]),
                ScaleDefinition::likert("Phish_Awareness", "AW", 3, &[]),
                ScaleDefinition::likert("Phish_Riesgo_Percibido", "PR", 3, &[]),
                ScaleDefinition::likert("Phish_Autoeficacia", "CP", 3, &[3]),
                ScaleDefinition::likert("Phish_Susceptibilidad", "SU", 4, &[]),
                ScaleDefinition::composite(
                    "Fatiga_Global_Score",
                    &[("FE", 3), ("FC", 4), ("DS", 2)],
                ),
            ],
        }
    }

    pub fn definitions(&self) -> &[ScaleDefinition] {
        &self.scales
    }

    /// All canonical padded item codes, in registry order.
    pub fn likert_item_codes(&self) -> Vec<String> {
        let mut codes = Vec::new();
        for definition in &self.scales {
            for item in &definition.items {
                if !codes.contains(&item.code) {
                    codes.push(item.code.clone());
                }
            }
        }
        codes
    }

    /// Normalize keys once, then score every registered scale. Best-effort:
    /// a scale with no answered items scores 0.0 and the rest still compute.
    pub fn compute_scores(&self, responses: &RawResponse) -> ScoreMap {
        let clean = alias::normalize_keys(responses);
        self.scales
            .iter()
            .map(|definition| {
                (
                    definition.name.to_string(),
                    score::score_scale(&clean, definition),
                )
            })
            .collect()
    }
}

impl Default for ScaleSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fill_scale(responses: &mut RawResponse, prefix: &str, count: u32, value: i64) {
        for i in 1..=count {
            responses.insert(format!("{prefix}{i:02}"), json!(value));
        }
    }

    #[test]
    fn registry_has_all_eleven_scales() {
        let set = ScaleSet::new();
        assert_eq!(set.definitions().len(), 11);
        let names: Vec<&str> = set.definitions().iter().map(|d| d.name).collect();
        assert!(names.contains(&"Big5_Apertura"));
        assert!(names.contains(&"Phish_Riesgo_Percibido"));
        assert!(names.contains(&"Fatiga_Global_Score"));
    }

    #[test]
    fn fatigue_scale_concatenates_sub_scales() {
        let set = ScaleSet::new();
        let fatigue = set
            .definitions()
            .iter()
            .find(|d| d.name == "Fatiga_Global_Score")
            .unwrap();
        let codes: Vec<&str> = fatigue.items.iter().map(|i| i.code.as_str()).collect();
        assert_eq!(
            codes,
            ["FE01", "FE02", "FE03", "FC01", "FC02", "FC03", "FC04", "DS01", "DS02"]
        );
    }

    #[test]
    fn compute_scores_returns_every_scale() {
        let set = ScaleSet::new();
        let scores = set.compute_scores(&RawResponse::new());
        assert_eq!(scores.len(), 11);
        // unanswered scales score 0.0 rather than failing
        assert!(scores.values().all(|&v| v == 0.0));
    }

    #[test]
    fn answered_scale_scores_while_others_stay_zero() {
        let set = ScaleSet::new();
        let mut responses = RawResponse::new();
        fill_scale(&mut responses, "AW", 3, 4);
        let scores = set.compute_scores(&responses);
        assert_eq!(scores["Phish_Awareness"], 4.0);
        assert_eq!(scores["Big5_Extraversion"], 0.0);
    }

    #[test]
    fn aliased_keys_reach_their_scale() {
        let set = ScaleSet::new();
        let mut responses = RawResponse::new();
        // old convention: "O" prefix, unpadded, for the openness scale
        for i in 1..=10 {
            responses.insert(format!("O{i}"), json!(3));
        }
        let scores = set.compute_scores(&responses);
        // items 6-10 are reverse coded; 3 inverts to 3, so the mean stays 3
        assert_eq!(scores["Big5_Apertura"], 3.0);
    }

    #[test]
    fn reverse_flags_apply_at_scoring_time() {
        let set = ScaleSet::new();
        let mut responses = RawResponse::new();
        fill_scale(&mut responses, "CP", 3, 5);
        let scores = set.compute_scores(&responses);
        // CP03 is reverse coded: (5 + 5 + 1) / 3
        assert!((scores["Phish_Autoeficacia"] - 11.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn item_codes_cover_all_prefix_families() {
        let set = ScaleSet::new();
        let codes = set.likert_item_codes();
        assert_eq!(codes.len(), 10 * 5 + 10 + 3 + 3 + 3 + 4 + 9);
        assert!(codes.contains(&"EX01".to_string()));
        assert!(codes.contains(&"DS02".to_string()));
    }
}
