//! Wildcard key selection and redaction
//!
//! Patterns are literal keys optionally containing `*`, which matches any
//! run of zero or more characters. `"kernel.*"`, `"*password*"` and
//! `"nvidia*version"` are all valid patterns.

use std::collections::BTreeMap;

use tracing::trace;

use crate::reading::Reading;

/// Check whether `key` matches a wildcard `pattern`
///
/// Without a `*` the pattern must equal the key. Otherwise the pattern is
/// split on `*`: the first segment must be a prefix, the last a suffix of
/// what remains, and every interior segment must occur in order between
/// them (leftmost occurrence first). Empty segments impose no constraint.
#[must_use]
pub fn matches(key: &str, pattern: &str) -> bool {
    if !pattern.contains('*') {
        return key == pattern;
    }

    let segments: Vec<&str> = pattern.split('*').collect();
    // at least two segments once a '*' is present
    let (first, rest) = (segments[0], &segments[1..]);
    let (last, interior) = match rest.split_last() {
        Some((last, interior)) => (*last, interior),
        None => return false,
    };

    let mut remaining = match key.strip_prefix(first) {
        Some(r) => r,
        None => return false,
    };

    for segment in interior.iter().filter(|s| !s.is_empty()) {
        match remaining.find(segment) {
            Some(idx) => remaining = &remaining[idx + segment.len()..],
            None => return false,
        }
    }

    remaining.ends_with(last)
}

fn matches_any<P: AsRef<str>>(key: &str, patterns: &[P]) -> bool {
    patterns.iter().any(|p| matches(key, p.as_ref()))
}

/// Keep only readings whose key matches at least one pattern
///
/// An empty pattern list yields an empty map. The input is never modified.
#[must_use]
pub fn filter_in<P: AsRef<str>>(
    readings: &BTreeMap<String, Reading>,
    patterns: &[P],
) -> BTreeMap<String, Reading> {
    readings
        .iter()
        .filter(|(key, _)| {
            let keep = matches_any(key, patterns);
            trace!(key = %key, keep, "filter in");
            keep
        })
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// Drop readings whose key matches any pattern
///
/// An empty pattern list yields a full copy. The input is never modified.
#[must_use]
pub fn filter_out<P: AsRef<str>>(
    readings: &BTreeMap<String, Reading>,
    patterns: &[P],
) -> BTreeMap<String, Reading> {
    readings
        .iter()
        .filter(|(key, _)| {
            let keep = !matches_any(key, patterns);
            trace!(key = %key, keep, "filter out");
            keep
        })
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}
