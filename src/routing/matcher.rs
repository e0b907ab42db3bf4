//! Structural matching and parameter extraction.
//!
//! # Responsibilities
//! - Decide whether a stored pattern matches a concrete request path
//! - Extract raw parameter values, left to right
//!
//! # Design Decisions
//! - Literal positions compare by equality
//! - A parameter position matches exactly one non-empty segment
//! - A wildcard position consumes the remainder (at least one segment),
//!   joined back with `/`; empty segments in the remainder are dropped
//! - No regex: matching is a single pass over both segment lists

use crate::routing::segment::{self, SegmentKind};

/// Walk `pattern` against `path`, returning the captured values on success.
///
/// Both inputs are already split, root segment first.
pub fn capture<S: AsRef<str>>(pattern: &[S], path: &[&str]) -> Option<Vec<String>> {
    let mut values = Vec::new();

    for (idx, stored) in pattern.iter().enumerate() {
        let stored: &str = stored.as_ref();
        match segment::classify(stored) {
            SegmentKind::Wildcard => {
                let rest = path
                    .get(idx..)?
                    .iter()
                    .filter(|s| !s.is_empty())
                    .copied()
                    .collect::<Vec<_>>()
                    .join("/");
                if rest.is_empty() {
                    return None;
                }
                values.push(rest);
                return Some(values);
            }
            SegmentKind::Param => {
                let value = path.get(idx).filter(|v| !v.is_empty())?;
                values.push((*value).to_string());
            }
            SegmentKind::Literal => {
                if path.get(idx).copied() != Some(stored) {
                    return None;
                }
            }
        }
    }

    (pattern.len() == path.len()).then_some(values)
}

/// Returns true if `pattern` structurally matches `path`.
pub fn matches<S: AsRef<str>>(pattern: &[S], path: &[&str]) -> bool {
    capture(pattern, path).is_some()
}

/// Raw parameter values for `path` under `pattern`; empty when they don't match.
pub fn extract<S: AsRef<str>>(pattern: &[S], path: &[&str]) -> Vec<String> {
    capture(pattern, path).unwrap_or_default()
}

/// Declared parameter names of a pattern, without their leading token.
pub fn param_names(pattern: &str) -> Vec<&str> {
    segment::split(segment::strip_query(pattern))
        .into_iter()
        .filter(|s| segment::classify(s) != SegmentKind::Literal)
        .map(|s| &s[1..])
        .collect()
}
