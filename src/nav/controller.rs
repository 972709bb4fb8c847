//! The navigation controller: current-route state, history operations,
//! and scroll bookkeeping.
//!
//! The controller owns the process-wide "where are we" state as reactive
//! cells. `navigate` (and `back`/`forward`) only update history and state;
//! rendering reacts to the cell change independently, so every mounted
//! outlet re-runs its pipeline off the same publish.

use super::scroll::{self, ScrollStrategy};
use crate::context::NavScope;
use crate::matcher::Matcher;
use crate::middleware::{fire_prefetch, NavRequest};
use crate::platform::{HistoryEntry, Platform};
use crate::reactive::Cell;
use crate::route::RouteTable;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info, warn};

/// Options for [`NavigationController::navigate`].
#[derive(Debug, Clone, Default)]
pub struct NavigateOptions {
    /// Replace the current history entry instead of pushing a new one.
    pub replace: bool,
    /// Values interpolated into named pattern segments (`:id`, `[id]`).
    pub params: HashMap<String, String>,
    /// Query pairs appended to the final location, in order.
    pub query: Vec<(String, String)>,
}

/// Per-navigation metadata consumed when applying scroll behavior.
#[derive(Debug, Clone)]
pub struct NavigationContext {
    /// Whether this navigation came from history traversal.
    pub is_popstate: bool,
    /// URL fragment, without the `#`.
    pub hash: Option<String>,
    /// Opaque scroll key of the active history entry.
    pub scroll_key: String,
}

impl NavigationContext {
    fn fresh(scroll_key: String) -> Self {
        Self {
            is_popstate: false,
            hash: None,
            scroll_key,
        }
    }
}

/// Owns current-route/query state, push/replace/back/forward, and scroll
/// persistence.
///
/// The route and query cells are process-wide, mutated only through the
/// controller's own operations, and read concurrently without tearing
/// (cell readers always observe the last fully-published value).
pub struct NavigationController {
    table: Option<Arc<RouteTable>>,
    platform: Platform,
    current_path: Cell<String>,
    current_query: Cell<HashMap<String, String>>,
    context: Mutex<NavigationContext>,
    matcher_cache: Mutex<Option<(u64, Arc<Matcher>)>>,
}

impl NavigationController {
    /// Controller without an ambient route table; outlets must carry an
    /// explicit one.
    #[must_use]
    pub fn new(platform: Platform) -> Arc<Self> {
        Self::build(None, platform)
    }

    /// Controller with an ambient route table shared by outlets that do
    /// not override it.
    #[must_use]
    pub fn with_table(table: Arc<RouteTable>, platform: Platform) -> Arc<Self> {
        Self::build(Some(table), platform)
    }

    fn build(table: Option<Arc<RouteTable>>, platform: Platform) -> Arc<Self> {
        let scroll_key = ulid::Ulid::new().to_string();
        let initial = match platform.history.current() {
            Some(entry) => entry,
            None => {
                let entry = HistoryEntry {
                    path: "/".to_string(),
                    scroll_key: scroll_key.clone(),
                };
                if let Err(e) = platform.history.replace(entry.clone()) {
                    warn!(error = %e, "Failed to seed initial history entry");
                }
                entry
            }
        };
        let (path, query, hash) = split_location(&initial.path);
        Arc::new(Self {
            table,
            platform,
            current_path: Cell::new(path),
            current_query: Cell::new(query),
            context: Mutex::new(NavigationContext {
                is_popstate: false,
                hash,
                scroll_key: initial.scroll_key,
            }),
            matcher_cache: Mutex::new(None),
        })
    }

    /// The ambient route table, if configured.
    #[must_use]
    pub fn table(&self) -> Option<Arc<RouteTable>> {
        self.table.clone()
    }

    /// Platform providers backing this controller.
    #[must_use]
    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    /// The current path (query and fragment stripped).
    #[must_use]
    pub fn current_path(&self) -> String {
        (*self.current_path.get()).clone()
    }

    /// Reactive cell holding the current path. Outlets subscribe here.
    #[must_use]
    pub fn path_cell(&self) -> Cell<String> {
        self.current_path.clone()
    }

    /// The current raw query fields.
    #[must_use]
    pub fn current_query(&self) -> HashMap<String, String> {
        (*self.current_query.get()).clone()
    }

    /// Snapshot of the active navigation context.
    #[must_use]
    pub fn navigation_context(&self) -> NavigationContext {
        self.context
            .lock()
            .map(|ctx| ctx.clone())
            .unwrap_or_else(|_| NavigationContext::fresh(ulid::Ulid::new().to_string()))
    }

    /// Navigate to `path`, interpolating params and assembling the final
    /// path + query.
    ///
    /// Pushes (or replaces) a history entry tagged with a fresh scroll
    /// key, updates route/query state, and stops - rendering reacts to
    /// the state change independently.
    pub fn navigate(&self, path: &str, options: NavigateOptions) {
        let interpolated = interpolate_params(path, &options.params);
        let (base, mut query, hash) = split_location(&interpolated);
        let mut pairs: Vec<(String, String)> = Vec::new();
        for (k, v) in &query {
            pairs.push((k.clone(), v.clone()));
        }
        for (k, v) in options.query {
            query.insert(k.clone(), v.clone());
            pairs.push((k, v));
        }
        let full = assemble_location(&base, &pairs, hash.as_deref());

        // Best-effort: remember where this page was scrolled to before
        // leaving it.
        let outgoing = self.navigation_context();
        scroll::persist_offset(&self.platform, &outgoing.scroll_key);

        let scroll_key = ulid::Ulid::new().to_string();
        let entry = HistoryEntry {
            path: full.clone(),
            scroll_key: scroll_key.clone(),
        };
        let pushed = if options.replace {
            self.platform.history.replace(entry)
        } else {
            self.platform.history.push(entry)
        };
        if let Err(e) = pushed {
            warn!(path = %full, error = %e, "History update failed");
        }

        info!(
            path = %base,
            query_count = query.len(),
            replace = options.replace,
            "Navigation"
        );

        if let Ok(mut ctx) = self.context.lock() {
            *ctx = NavigationContext {
                is_popstate: false,
                hash,
                scroll_key,
            };
        }
        self.current_query.set(query);
        self.current_path.set(base);
    }

    /// Traverse one history entry back.
    pub fn back(&self) {
        self.traverse(|h| h.back(), "back");
    }

    /// Traverse one history entry forward.
    pub fn forward(&self) {
        self.traverse(|h| h.forward(), "forward");
    }

    fn traverse(
        &self,
        step: impl FnOnce(&dyn crate::platform::HistoryProvider) -> Option<HistoryEntry>,
        direction: &str,
    ) {
        let outgoing = self.navigation_context();
        scroll::persist_offset(&self.platform, &outgoing.scroll_key);

        let Some(entry) = step(self.platform.history.as_ref()) else {
            debug!(direction = direction, "History traversal hit the edge");
            return;
        };
        let (path, query, hash) = split_location(&entry.path);
        info!(direction = direction, path = %path, "History traversal");

        if let Ok(mut ctx) = self.context.lock() {
            *ctx = NavigationContext {
                is_popstate: true,
                hash,
                scroll_key: entry.scroll_key,
            };
        }
        self.current_query.set(query);
        self.current_path.set(path);
    }

    /// Reactive boolean tracking whether `path` is the current route
    /// (`exact`) or a prefix of it.
    #[must_use]
    pub fn is_active(&self, path: &str, exact: bool) -> Cell<bool> {
        let target = normalize_path(path);
        self.current_path.derive(move |current| {
            if target == "/" {
                return if exact { current == "/" } else { true };
            }
            if current == &target {
                return true;
            }
            !exact && current.starts_with(&format!("{target}/"))
        })
    }

    /// Match `path` against the ambient table and fire the matched
    /// route's prefetch tasks. Best-effort; does nothing without a table
    /// or a match.
    pub fn prefetch(self: &Arc<Self>, path: &str) {
        let Some(table) = self.table.clone() else {
            debug!(path = %path, "Prefetch skipped: no ambient route table");
            return;
        };
        let Some(matcher) = self.matcher_for(&table) else {
            return;
        };
        let Some(m) = matcher.match_path(path) else {
            debug!(path = %path, "Prefetch skipped: no matching route");
            return;
        };
        let (base, query, _hash) = split_location(path);
        let req = NavRequest::from_match(&base, &m, query);
        fire_prefetch(&m.route, &req, NavScope::new(Arc::clone(self)));
    }

    /// Apply a route's scroll strategy for the navigation that just
    /// rendered.
    pub fn apply_scroll(&self, strategy: ScrollStrategy) {
        let ctx = self.navigation_context();
        scroll::apply(&self.platform, strategy, &ctx);
    }

    /// Compiled matcher for `table`, memoized by table identity.
    pub(crate) fn matcher_for(&self, table: &Arc<RouteTable>) -> Option<Arc<Matcher>> {
        if let Ok(mut cache) = self.matcher_cache.lock() {
            if let Some((id, matcher)) = cache.as_ref() {
                if *id == table.id() {
                    return Some(Arc::clone(matcher));
                }
            }
            match Matcher::new(table.routes()) {
                Ok(matcher) => {
                    let matcher = Arc::new(matcher);
                    *cache = Some((table.id(), Arc::clone(&matcher)));
                    Some(matcher)
                }
                Err(e) => {
                    error!(table_id = table.id(), error = %e, "Matcher compilation failed");
                    None
                }
            }
        } else {
            None
        }
    }
}

impl std::fmt::Debug for NavigationController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NavigationController")
            .field("path", &self.current_path())
            .finish()
    }
}

/// Split a location string into (normalized path, query map, fragment).
pub(crate) fn split_location(location: &str) -> (String, HashMap<String, String>, Option<String>) {
    let (without_hash, hash) = match location.split_once('#') {
        Some((l, h)) => (l, Some(h.to_string())),
        None => (location, None),
    };
    let (path, query) = match without_hash.split_once('?') {
        Some((p, q)) => (p, parse_query(q)),
        None => (without_hash, HashMap::new()),
    };
    (normalize_path(path), query, hash)
}

fn normalize_path(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

fn parse_query(raw: &str) -> HashMap<String, String> {
    let mut query = HashMap::new();
    for pair in raw.split('&').filter(|p| !p.is_empty()) {
        let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
        query.insert(
            urlencoding::decode(k).map(|c| c.into_owned()).unwrap_or_else(|_| k.to_string()),
            urlencoding::decode(v).map(|c| c.into_owned()).unwrap_or_else(|_| v.to_string()),
        );
    }
    query
}

fn assemble_location(base: &str, pairs: &[(String, String)], hash: Option<&str>) -> String {
    let mut location = base.to_string();
    if !pairs.is_empty() {
        let qs: Vec<String> = pairs
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect();
        location.push('?');
        location.push_str(&qs.join("&"));
    }
    if let Some(hash) = hash {
        location.push('#');
        location.push_str(hash);
    }
    location
}

/// Replace named pattern segments with provided param values.
///
/// Trailing-capture values (`:rest*`, `:rest+`, `[...rest]`) are inserted
/// verbatim so multi-segment captures keep their slashes; single-segment
/// params are percent-encoded.
fn interpolate_params(pattern: &str, params: &HashMap<String, String>) -> String {
    if params.is_empty() {
        return pattern.to_string();
    }
    let segments: Vec<String> = pattern
        .split('/')
        .map(|segment| {
            let (name, multi) = match param_name(segment) {
                Some(parsed) => parsed,
                None => return segment.to_string(),
            };
            match params.get(name) {
                Some(value) if multi => value.clone(),
                Some(value) => urlencoding::encode(value).into_owned(),
                None => {
                    warn!(segment = %segment, "No value provided for pattern param");
                    segment.to_string()
                }
            }
        })
        .collect();
    segments.join("/")
}

/// `(name, is_multi_segment)` for a param-shaped segment, `None` for
/// literals.
fn param_name(segment: &str) -> Option<(&str, bool)> {
    if let Some(inner) = segment.strip_prefix("[...").and_then(|s| s.strip_suffix(']')) {
        return Some((inner, true));
    }
    if let Some(inner) = segment.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        return Some((inner, false));
    }
    if let Some(name) = segment.strip_prefix(':') {
        if let Some(name) = name.strip_suffix('*').or_else(|| name.strip_suffix('+')) {
            return Some((name, true));
        }
        return Some((name, false));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_location() {
        let (path, query, hash) = split_location("/search?q=hello&page=2#results");
        assert_eq!(path, "/search");
        assert_eq!(query.get("q").map(String::as_str), Some("hello"));
        assert_eq!(query.get("page").map(String::as_str), Some("2"));
        assert_eq!(hash.as_deref(), Some("results"));
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("/users/"), "/users");
        assert_eq!(normalize_path("users"), "/users");
    }

    #[test]
    fn test_interpolate_single_param() {
        let params = HashMap::from([("id".to_string(), "42".to_string())]);
        assert_eq!(interpolate_params("/users/:id", &params), "/users/42");
        assert_eq!(interpolate_params("/users/[id]", &params), "/users/42");
    }

    #[test]
    fn test_interpolate_multi_segment_param_keeps_slashes() {
        let params = HashMap::from([("path".to_string(), "docs/api".to_string())]);
        assert_eq!(interpolate_params("/files/:path*", &params), "/files/docs/api");
    }

    #[test]
    fn test_interpolate_encodes_single_values() {
        let params = HashMap::from([("q".to_string(), "a b".to_string())]);
        assert_eq!(interpolate_params("/tag/:q", &params), "/tag/a%20b");
    }
}
