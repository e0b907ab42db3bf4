//! Path segment utilities shared by registration and lookup.
//!
//! Every stored pattern and every incoming request path goes through the
//! same `strip_query` → `normalize` → `split` pipeline, so both sides are
//! compared on the same segment set.

use crate::routing::error::{RouteError, RouteResult};

/// Canonical key for a parameter segment (`:name`).
pub const PARAM_TOKEN: &str = ":";

/// Canonical key for a wildcard segment (`*name`).
pub const WILDCARD_TOKEN: &str = "*";

/// Key of every method root.
pub const ROOT_SEGMENT: &str = "/";

/// Kind of a single path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Literal,
    Param,
    Wildcard,
}

/// Classify a segment by its leading token.
pub fn classify(segment: &str) -> SegmentKind {
    if segment.starts_with(PARAM_TOKEN) {
        SegmentKind::Param
    } else if segment.starts_with(WILDCARD_TOKEN) {
        SegmentKind::Wildcard
    } else {
        SegmentKind::Literal
    }
}

/// Reduce a segment to the key it is stored under in the trie.
///
/// All parameter names compare equal, as do all wildcard names.
pub fn canonical(segment: &str) -> &str {
    match classify(segment) {
        SegmentKind::Param => PARAM_TOKEN,
        SegmentKind::Wildcard => WILDCARD_TOKEN,
        SegmentKind::Literal => segment,
    }
}

/// Remove the query string and fragment from a request target.
pub fn strip_query(path: &str) -> &str {
    match path.find(['?', '#']) {
        Some(idx) => &path[..idx],
        None => path,
    }
}

/// Validate the leading slash and drop trailing slashes.
///
/// The root path `/` is returned unchanged.
pub fn normalize(path: &str) -> RouteResult<&str> {
    if !path.starts_with('/') {
        return Err(RouteError::InvalidPathFormat(path.to_string()));
    }
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        Ok(ROOT_SEGMENT)
    } else {
        Ok(trimmed)
    }
}

/// Split a normalized path. The first element is always the root segment.
pub fn split(path: &str) -> Vec<&str> {
    let mut segments = vec![ROOT_SEGMENT];
    if path != ROOT_SEGMENT {
        segments.extend(path.trim_start_matches('/').split('/'));
    }
    segments
}

/// Strip the query string, normalize and split a route pattern,
/// rejecting empty segments.
pub fn pattern_segments(pattern: &str) -> RouteResult<Vec<&str>> {
    let segments = normalize(strip_query(pattern))
        .map(split)
        .map_err(|_| RouteError::InvalidPathFormat(pattern.to_string()))?;
    if segments.iter().skip(1).any(|s| s.is_empty()) {
        return Err(RouteError::InvalidPathFormat(pattern.to_string()));
    }
    Ok(segments)
}

/// Strip the query string, normalize and split a request path.
pub fn request_segments(path: &str) -> RouteResult<Vec<&str>> {
    Ok(split(normalize(strip_query(path))?))
}
