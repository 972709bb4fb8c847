//! Async render offloading with deduplication and stale rejection.
//!
//! Each outlet owns one loader. A render that goes through the loader is
//! keyed by its match identity (path plus extracted params plus query);
//! re-presenting an in-flight key is a no-op, a settled key republishes
//! its cached content synchronously, and a coroutine completing for a key
//! that is no longer active publishes nothing.

use crate::content::Content;
use crate::reactive::Cell;
use crate::runtime_config::RuntimeConfig;
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex};
use tracing::{debug, error, warn};

/// What an outlet shows while an async render for a new match key is in
/// flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadingPolicy {
    /// Swap in the loading boundary immediately.
    #[default]
    Fallback,
    /// Keep the previous content on screen until the new render settles.
    KeepStale,
}

#[derive(Default)]
struct LoaderEntry {
    settled: Option<Content>,
    in_flight: bool,
}

/// Settled results kept per outlet before eviction kicks in.
const MAX_SETTLED_ENTRIES: usize = 32;

/// Deduplicating async render runner for a single outlet.
pub struct AsyncLoader {
    entries: DashMap<String, LoaderEntry>,
    active: Mutex<String>,
    stack_size: usize,
}

impl AsyncLoader {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            entries: DashMap::new(),
            active: Mutex::new(String::new()),
            stack_size: RuntimeConfig::global().stack_size,
        })
    }

    /// Identity of a match for dedup purposes: same path, params, and
    /// query mean the same render.
    #[must_use]
    pub fn match_key(
        path: &str,
        params: &std::collections::HashMap<String, String>,
        query: &std::collections::HashMap<String, String>,
    ) -> String {
        // BTreeMap for a stable field order in the key.
        let params: BTreeMap<&str, &str> =
            params.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        let query: BTreeMap<&str, &str> =
            query.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        format!("{path}|{params:?}|{query:?}")
    }

    /// Present `key` on the outlet.
    ///
    /// Publishes a cached settled result synchronously when one exists.
    /// Otherwise applies `policy` (fallback content or keep-stale), then
    /// runs `task` on a forked coroutine; its result is published only if
    /// `key` is still the active one when it settles.
    pub fn present(
        self: &Arc<Self>,
        key: String,
        task: Box<dyn FnOnce() -> Content + Send>,
        fallback: Content,
        policy: LoadingPolicy,
        output: Cell<Content>,
    ) {
        if let Ok(mut active) = self.active.lock() {
            *active = key.clone();
        }
        if self.entries.len() >= MAX_SETTLED_ENTRIES {
            debug!(
                entries = self.entries.len(),
                "Loader cache at capacity, evicting settled entries"
            );
            self.entries.retain(|k, e| e.in_flight || *k == key);
        }

        let deduplicated = {
            let mut entry = self.entries.entry(key.clone()).or_default();
            if let Some(settled) = entry.settled.clone() {
                debug!(match_key = %key, "Async render already settled, republishing");
                drop(entry);
                output.set(settled);
                return;
            }
            if entry.in_flight {
                debug!(match_key = %key, "Async render already in flight, deduplicated");
                true
            } else {
                entry.in_flight = true;
                false
            }
        };

        // The loading policy applies even when the render itself is
        // deduplicated: coming back to an in-flight key must still show
        // its loading boundary, not whatever was published since.
        match policy {
            LoadingPolicy::Fallback => output.set(fallback),
            LoadingPolicy::KeepStale => {
                debug!(match_key = %key, "Keeping stale content while render is in flight");
            }
        }
        if deduplicated {
            return;
        }

        let loader = Arc::clone(self);
        let spawn_key = key.clone();
        let builder = may::coroutine::Builder::new().stack_size(self.stack_size);
        // SAFETY: the spawned closure owns everything it touches (Arc
        // handles and the render task) and never borrows the caller's
        // stack.
        let spawned = unsafe {
            builder.spawn(move || {
                let result = catch_unwind(AssertUnwindSafe(task));
                let content = match result {
                    Ok(content) => content,
                    Err(_) => {
                        warn!(match_key = %key, "Async render panicked, settling empty");
                        Content::Empty
                    }
                };
                if let Some(mut entry) = loader.entries.get_mut(&key) {
                    entry.settled = Some(content.clone());
                    entry.in_flight = false;
                }
                let still_active = loader
                    .active
                    .lock()
                    .map(|active| *active == key)
                    .unwrap_or(false);
                if still_active {
                    debug!(match_key = %key, "Async render settled, publishing");
                    output.set(content);
                } else {
                    debug!(match_key = %key, "Async render settled for inactive key, discarded");
                }
            })
        };
        if let Err(e) = spawned {
            error!(match_key = %spawn_key, error = %e, "Failed to spawn async render coroutine");
            self.clear_in_flight(&spawn_key);
        }
    }

    fn clear_in_flight(&self, key: &str) {
        if let Some(mut entry) = self.entries.get_mut(key) {
            entry.in_flight = false;
        }
    }

    /// Drop the cached result for `key` so the next presentation re-runs
    /// the render.
    pub fn invalidate(&self, key: &str) {
        self.entries.remove(key);
    }
}

impl std::fmt::Debug for AsyncLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncLoader")
            .field("entries", &self.entries.len())
            .finish()
    }
}
