//! Matcher facade - hot path for navigation matching.
//!
//! Compiles a resolved route table into a prefix trie once, then matches
//! the active URL in O(path depth) regardless of how many routes are
//! registered. No linear scan across the table ever happens per
//! navigation.

use crate::route::ResolvedRoute;
use smallvec::SmallVec;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::trie::{CompiledRoute, Segment, TrieNode};

/// Maximum number of path parameters before heap allocation.
/// Deeply parameterized UI routes rarely exceed 4 params.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated parameter storage for the match hot path.
///
/// Param names are `Arc<str>` because they come from the static pattern
/// tree (cloning is an atomic increment); values are per-navigation data
/// from the URL and stay `String`.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Result of successfully matching a path against the route table.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    /// The matched resolved route.
    pub route: Arc<ResolvedRoute>,
    /// Params extracted from the URL (e.g. `:id` → `("id", "123")`).
    pub params: ParamVec,
}

impl RouteMatch {
    /// Get an extracted parameter by name.
    ///
    /// Uses "last write wins" semantics for duplicate names at different
    /// path depths.
    #[inline]
    #[must_use]
    pub fn get_param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Convert params to a `HashMap` for compatibility with map-shaped
    /// consumers. Note: this allocates - use `get_param()` in hot paths.
    #[must_use]
    pub fn params_map(&self) -> HashMap<String, String> {
        self.params
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }
}

/// Trie-backed matcher compiled from a resolved route table.
///
/// Built once per table identity and cached by the outlet; matching is
/// O(path depth) with candidate ranking by (segment count desc, score
/// desc, registration order asc).
pub struct Matcher {
    root: TrieNode,
    route_count: usize,
}

impl Matcher {
    /// Compile a matcher from resolved routes.
    ///
    /// Routes are stable-sorted (longer patterns first, then higher
    /// score) before insertion so equally ranked candidates keep their
    /// authoring order inside each trie node.
    pub fn new(routes: &[Arc<ResolvedRoute>]) -> anyhow::Result<Self> {
        let mut compiled = Vec::with_capacity(routes.len());
        for (index, route) in routes.iter().enumerate() {
            compiled.push(Arc::new(CompiledRoute::new(Arc::clone(route), index)?));
        }

        compiled.sort_by(|a, b| {
            b.segments
                .len()
                .cmp(&a.segments.len())
                .then_with(|| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal))
        });

        let mut root = TrieNode::default();
        for route in &compiled {
            root.insert(&route.segments, Arc::clone(route));
        }

        info!(
            routes_count = compiled.len(),
            algorithm = "segment_trie",
            "Matcher compiled"
        );

        Ok(Self {
            root,
            route_count: routes.len(),
        })
    }

    /// Number of compiled routes.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.route_count
    }

    /// Match a location string against the table.
    ///
    /// Query string and fragment are stripped before matching; leading and
    /// trailing slashes are ignored. Returns `None` when no registered
    /// pattern covers the path.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<RouteMatch> {
        debug!(path = %path, "Route match attempt");
        let match_start = std::time::Instant::now();

        let bare = path
            .split(['?', '#'])
            .next()
            .unwrap_or(path);
        let parts: Vec<&str> = bare
            .trim_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();

        let mut candidates = Vec::new();
        self.root.collect(&parts, 0, &mut candidates);

        candidates.sort_by(|a, b| {
            b.segments
                .len()
                .cmp(&a.segments.len())
                .then_with(|| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal))
                .then_with(|| a.index.cmp(&b.index))
        });

        let match_duration = match_start.elapsed();
        let Some(winner) = candidates.first() else {
            warn!(
                path = %path,
                duration_us = match_duration.as_micros(),
                "No route matched"
            );
            return None;
        };

        let params = extract_params(winner, &parts);
        if match_duration > std::time::Duration::from_millis(1) {
            warn!(
                path = %path,
                route_pattern = %winner.route.path,
                candidates = candidates.len(),
                duration_us = match_duration.as_micros(),
                "Slow route matching detected"
            );
        } else {
            debug!(
                path = %path,
                route_pattern = %winner.route.path,
                candidates = candidates.len(),
                params = ?params,
                duration_us = match_duration.as_micros(),
                "Route matched"
            );
        }

        Some(RouteMatch {
            route: Arc::clone(&winner.route),
            params,
        })
    }
}

/// Zip a winning pattern against the path parts to pull out params.
///
/// The candidate is full-length by construction, so positions line up
/// deterministically; a trailing capture takes the slash-joined remainder
/// (possibly empty for an optional capture).
fn extract_params(route: &CompiledRoute, parts: &[&str]) -> ParamVec {
    let mut params = ParamVec::new();
    for (i, segment) in route.segments.iter().enumerate() {
        match segment {
            Segment::Static(_) => {}
            Segment::Param(name) => {
                if let Some(part) = parts.get(i) {
                    params.push((Arc::clone(name), (*part).to_string()));
                }
            }
            Segment::Wildcard(name) | Segment::CatchAllRequired(name) => {
                let remainder = parts.get(i..).unwrap_or(&[]).join("/");
                params.push((Arc::clone(name), remainder));
            }
        }
    }
    params
}
