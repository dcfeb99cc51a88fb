//! "Did you mean" suggestions for mark keys that matched nothing

use std::collections::BTreeSet;

/// Minimum Jaro-Winkler similarity for a suggestion
const THRESHOLD: f64 = 0.8;

/// The candidate closest to `key`, if any is close enough.
///
/// Exact matches are never suggested.
pub fn closest<'a>(key: &str, candidates: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    candidates
        .into_iter()
        .filter(|candidate| *candidate != key)
        .map(|candidate| (candidate, strsim::jaro_winkler(key, candidate)))
        .filter(|(_, score)| *score >= THRESHOLD)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(candidate, _)| candidate)
}

/// An unmatched mark key and the nearest name the walker saw
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unmatched<'a> {
    pub key: &'a str,
    pub suggestion: Option<&'a str>,
}

/// Pair every unmatched key with its closest considered name
pub fn unmatched_with_suggestions<'a>(
    unmatched: &[&'a str],
    considered: &'a BTreeSet<String>,
) -> Vec<Unmatched<'a>> {
    unmatched
        .iter()
        .map(|&key| Unmatched {
            key,
            suggestion: closest(key, considered.iter().map(String::as_str)),
        })
        .collect()
}
