//! Prefix-trie pattern compilation and candidate collection.
//!
//! Patterns are parsed into ordered segments of four kinds:
//!
//! - `static` - literal text, matches exactly
//! - `param` (`:name` or `[name]`) - exactly one path segment
//! - `wildcard` (`:name*`, `[...name]`, or bare `*`) - zero or more
//!   trailing segments
//! - `required catch-all` (`:name+`) - one or more trailing segments
//!
//! Each segment carries a precedence score (static 3, param 2, required
//! catch-all 1.5, wildcard 1); a route's total score is the segment sum
//! plus 0.1 per segment as a specificity tiebreaker. A trailing capture
//! always terminates descent; nothing nests beneath it.
//!
//! Matching collects every full-length candidate at all applicable
//! branches (static, param, wildcard) and leaves ranking to the caller,
//! which sorts by segment count, then score, then registration order.

use crate::route::ResolvedRoute;
use anyhow::bail;
use std::collections::HashMap;
use std::sync::Arc;

/// One parsed pattern segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Segment {
    /// Literal segment.
    Static(String),
    /// Named single-segment parameter.
    Param(Arc<str>),
    /// Named optional trailing capture (zero or more segments).
    Wildcard(Arc<str>),
    /// Named required trailing capture (one or more segments).
    CatchAllRequired(Arc<str>),
}

impl Segment {
    /// Precedence score: static beats param beats required catch-all
    /// beats wildcard.
    pub(crate) fn score(&self) -> f64 {
        match self {
            Segment::Static(_) => 3.0,
            Segment::Param(_) => 2.0,
            Segment::CatchAllRequired(_) => 1.5,
            Segment::Wildcard(_) => 1.0,
        }
    }

    /// Whether this segment captures the path remainder.
    pub(crate) fn is_trailing_capture(&self) -> bool {
        matches!(self, Segment::Wildcard(_) | Segment::CatchAllRequired(_))
    }
}

fn parse_segment(raw: &str) -> Segment {
    if raw == "*" {
        return Segment::Wildcard(Arc::from("*"));
    }
    if let Some(inner) = raw.strip_prefix("[...").and_then(|s| s.strip_suffix(']')) {
        return Segment::Wildcard(Arc::from(inner));
    }
    if let Some(inner) = raw.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        return Segment::Param(Arc::from(inner));
    }
    if let Some(name) = raw.strip_prefix(':') {
        if let Some(name) = name.strip_suffix('*') {
            return Segment::Wildcard(Arc::from(name));
        }
        if let Some(name) = name.strip_suffix('+') {
            return Segment::CatchAllRequired(Arc::from(name));
        }
        return Segment::Param(Arc::from(name));
    }
    Segment::Static(raw.to_string())
}

/// Parse an absolute path pattern into ordered segments.
///
/// Rejects patterns with segments after a trailing capture, since a
/// capture consumes the whole remainder.
pub(crate) fn parse_pattern(path: &str) -> anyhow::Result<Vec<Segment>> {
    let segments: Vec<Segment> = path
        .trim_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .map(parse_segment)
        .collect();

    for (i, segment) in segments.iter().enumerate() {
        if segment.is_trailing_capture() && i + 1 != segments.len() {
            bail!("pattern '{path}' nests segments beneath a catch-all capture");
        }
    }
    Ok(segments)
}

/// A route compiled for trie insertion.
#[derive(Debug)]
pub(crate) struct CompiledRoute {
    pub route: Arc<ResolvedRoute>,
    pub segments: Vec<Segment>,
    /// Segment score sum + 0.1 per segment.
    pub score: f64,
    /// Registration order; first-registered wins remaining ties.
    pub index: usize,
}

impl CompiledRoute {
    pub(crate) fn new(route: Arc<ResolvedRoute>, index: usize) -> anyhow::Result<Self> {
        let segments = parse_pattern(&route.path)?;
        let score = segments.iter().map(Segment::score).sum::<f64>()
            + segments.len() as f64 * 0.1;
        Ok(Self {
            route,
            segments,
            score,
            index,
        })
    }

    fn terminal(&self) -> Option<&Segment> {
        self.segments.last()
    }

    /// Whether this route ends in an optional (zero-or-more) capture.
    fn has_optional_terminal(&self) -> bool {
        matches!(self.terminal(), Some(Segment::Wildcard(_)))
    }
}

/// Trie node: literal children in a map, at most one param child, at most
/// one wildcard child. Routes terminate at the node matching their final
/// segment; trailing captures terminate at the wildcard child.
#[derive(Default)]
pub(crate) struct TrieNode {
    statics: HashMap<String, TrieNode>,
    param: Option<Box<TrieNode>>,
    wildcard: Option<Box<TrieNode>>,
    routes: Vec<Arc<CompiledRoute>>,
}

impl TrieNode {
    pub(crate) fn insert(&mut self, segments: &[Segment], route: Arc<CompiledRoute>) {
        let Some(first) = segments.first() else {
            self.routes.push(route);
            return;
        };
        let rest = &segments[1..];
        match first {
            Segment::Static(literal) => self
                .statics
                .entry(literal.clone())
                .or_default()
                .insert(rest, route),
            Segment::Param(_) => self
                .param
                .get_or_insert_with(Box::default)
                .insert(rest, route),
            // A capture consumes the remainder; the route terminates here.
            Segment::Wildcard(_) | Segment::CatchAllRequired(_) => self
                .wildcard
                .get_or_insert_with(Box::default)
                .routes
                .push(route),
        }
    }

    /// Collect every candidate whose pattern covers the full path.
    pub(crate) fn collect(
        &self,
        parts: &[&str],
        depth: usize,
        out: &mut Vec<Arc<CompiledRoute>>,
    ) {
        if depth == parts.len() {
            out.extend(self.routes.iter().map(Arc::clone));
            // Path exhausted: an optional capture still matches with an
            // empty remainder; a required one does not.
            if let Some(wildcard) = &self.wildcard {
                out.extend(
                    wildcard
                        .routes
                        .iter()
                        .filter(|r| r.has_optional_terminal())
                        .map(Arc::clone),
                );
            }
            return;
        }

        if let Some(child) = self.statics.get(parts[depth]) {
            child.collect(parts, depth + 1, out);
        }
        if let Some(child) = &self.param {
            child.collect(parts, depth + 1, out);
        }
        if let Some(wildcard) = &self.wildcard {
            // Remainder is non-empty here, so required and optional
            // captures both qualify.
            out.extend(wildcard.routes.iter().map(Arc::clone));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_param_forms() {
        assert_eq!(parse_segment(":id"), Segment::Param(Arc::from("id")));
        assert_eq!(parse_segment("[id]"), Segment::Param(Arc::from("id")));
    }

    #[test]
    fn test_parse_capture_forms() {
        assert_eq!(parse_segment(":rest*"), Segment::Wildcard(Arc::from("rest")));
        assert_eq!(
            parse_segment("[...rest]"),
            Segment::Wildcard(Arc::from("rest"))
        );
        assert_eq!(
            parse_segment(":rest+"),
            Segment::CatchAllRequired(Arc::from("rest"))
        );
        assert_eq!(parse_segment("*"), Segment::Wildcard(Arc::from("*")));
    }

    #[test]
    fn test_parse_static() {
        assert_eq!(
            parse_segment("users"),
            Segment::Static("users".to_string())
        );
    }

    #[test]
    fn test_pattern_rejects_segments_after_capture() {
        assert!(parse_pattern("/files/:rest*/extra").is_err());
        assert!(parse_pattern("/files/:rest*").is_ok());
    }

    #[test]
    fn test_root_pattern_is_empty() {
        assert!(parse_pattern("/").unwrap().is_empty());
    }

    #[test]
    fn test_segment_scores_order_kinds() {
        let static_s = parse_segment("users").score();
        let param_s = parse_segment(":id").score();
        let required_s = parse_segment(":p+").score();
        let wildcard_s = parse_segment(":p*").score();
        assert!(static_s > param_s);
        assert!(param_s > required_s);
        assert!(required_s > wildcard_s);
    }
}
