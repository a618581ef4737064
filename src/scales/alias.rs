use crate::core::RawResponse;

/// Historical item-code prefixes mapped to the canonical two-letter prefix.
/// Canonical prefixes map to themselves so unpadded canonical keys (e.g.
/// `EX1`) still gain their zero-padded twin.
const PREFIX_ALIASES: &[(&str, &str)] = &[
    // Big Five
    ("E", "EX"),
    ("EXT", "EX"),
    ("EX", "EX"),
    ("A", "AM"),
    ("AGR", "AM"),
    ("AM", "AM"),
    ("C", "CO"),
    ("CON", "CO"),
    ("CS", "CO"),
    ("CO", "CO"),
    ("N", "NE"),
    ("NEU", "NE"),
    ("NE", "NE"),
    ("O", "AE"),
    ("OPE", "AE"),
    ("AE", "AE"),
    // Phishing scales
    ("AR", "ER"),
    ("ER", "ER"),
    ("AW", "AW"),
    ("PR", "PR"),
    ("SE", "CP"),
    ("CP", "CP"),
    ("SU", "SU"),
    // Fatigue sub-scales
    ("FE", "FE"),
    ("FC", "FC"),
    ("DS", "DS"),
];

/// Keys longer than this are demographics or other non-item codes and pass
/// through untouched.
const SHORT_CODE_MAX: usize = 5;

fn canonical_prefix(prefix: &str) -> Option<&'static str> {
    PREFIX_ALIASES
        .iter()
        .find(|(alias, _)| alias.eq_ignore_ascii_case(prefix))
        .map(|(_, canonical)| *canonical)
}

/// Split an item code into its alphabetic prefix and numeric index.
/// Returns None unless the key is exactly `<letters><digits>`.
pub(crate) fn split_item_code(key: &str) -> Option<(&str, u32)> {
    let digits_at = key.find(|c: char| c.is_ascii_digit())?;
    if digits_at == 0 {
        return None;
    }
    let (prefix, digits) = key.split_at(digits_at);
    if !prefix.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let index = digits.parse().ok()?;
    Some((prefix, index))
}

/// Reconcile historical item-code conventions into the canonical code space.
///
/// For every short key whose prefix has a known alias, both the zero-padded
/// (`EX01`) and unpadded (`EX1`) canonical forms are added alongside the
/// original entry. Purely additive: existing keys are never removed, unknown
/// prefixes and long (demographic) keys pass through, and applying it twice
/// yields the same map as applying it once.
pub fn normalize_keys(responses: &RawResponse) -> RawResponse {
    let mut normalized = responses.clone();
    for (key, value) in responses {
        if key.len() > SHORT_CODE_MAX {
            continue;
        }
        let Some((prefix, index)) = split_item_code(key) else {
            continue;
        };
        let Some(canonical) = canonical_prefix(prefix) else {
            continue;
        };
        normalized.insert(format!("{canonical}{index:02}"), value.clone());
        normalized.insert(format!("{canonical}{index}"), value.clone());
    }
    normalized
}
