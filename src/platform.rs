//! # Platform Provider Module
//!
//! Seams to the host environment: browser history, key-value storage,
//! scroll position, and DOM queries. The navigation engine only ever talks
//! to these traits; the host wires in real browser bindings, and the
//! bundled in-memory implementations back the test suite.
//!
//! Every provider operation is best-effort from the engine's point of
//! view: failures are logged and ignored, never surfaced to the render
//! pipeline.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// One browser-history entry. The scroll key travels with the entry so a
/// popstate traversal can correlate back to its persisted scroll offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    /// Full location string (path, query, fragment).
    pub path: String,
    /// Opaque per-entry scroll key.
    pub scroll_key: String,
}

/// Browser history contract.
pub trait HistoryProvider: Send + Sync {
    /// Push a new entry, truncating any forward entries.
    fn push(&self, entry: HistoryEntry) -> anyhow::Result<()>;
    /// Replace the current entry in place.
    fn replace(&self, entry: HistoryEntry) -> anyhow::Result<()>;
    /// Traverse one entry back. Returns the new current entry.
    fn back(&self) -> Option<HistoryEntry>;
    /// Traverse one entry forward. Returns the new current entry.
    fn forward(&self) -> Option<HistoryEntry>;
    /// The current entry, if any.
    fn current(&self) -> Option<HistoryEntry>;
}

/// String key-value storage contract (e.g. `sessionStorage`).
pub trait StorageProvider: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;
    fn remove(&self, key: &str);
}

/// Persisted scroll offset, serialized as `{x, y}`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScrollOffset {
    pub x: f64,
    pub y: f64,
}

impl ScrollOffset {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Viewport scrolling contract.
pub trait ScrollProvider: Send + Sync {
    /// Current viewport offset.
    fn current_offset(&self) -> ScrollOffset;
    /// Jump the viewport to `offset`.
    fn scroll_to(&self, offset: ScrollOffset);
    /// Scroll the element matching `fragment` into view.
    fn scroll_into_view(&self, fragment: &str);
    /// Run `f` after the next paint, once the outlet's DOM update has
    /// landed.
    fn after_paint(&self, f: Box<dyn FnOnce() + Send>);
}

/// Minimal DOM query contract.
pub trait DomProvider: Send + Sync {
    /// Whether an element with the given id exists.
    fn element_exists(&self, id: &str) -> bool;
}

/// Bundle of platform providers handed to the navigation controller.
#[derive(Clone)]
pub struct Platform {
    pub history: Arc<dyn HistoryProvider>,
    pub storage: Arc<dyn StorageProvider>,
    pub scroll: Arc<dyn ScrollProvider>,
    pub dom: Arc<dyn DomProvider>,
}

impl Platform {
    /// Wire custom providers.
    #[must_use]
    pub fn new(
        history: Arc<dyn HistoryProvider>,
        storage: Arc<dyn StorageProvider>,
        scroll: Arc<dyn ScrollProvider>,
        dom: Arc<dyn DomProvider>,
    ) -> Self {
        Self {
            history,
            storage,
            scroll,
            dom,
        }
    }

    /// Fully in-memory platform. `after_paint` runs callbacks immediately,
    /// which keeps tests deterministic.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            history: Arc::new(MemoryHistory::new()),
            storage: Arc::new(MemoryStorage::new()),
            scroll: Arc::new(MemoryScroll::new()),
            dom: Arc::new(MemoryDom::new()),
        }
    }
}

impl std::fmt::Debug for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Platform")
    }
}

/// In-memory history stack: a vector of entries plus a cursor.
#[derive(Default)]
pub struct MemoryHistory {
    state: Mutex<(Vec<HistoryEntry>, Option<usize>)>,
}

impl MemoryHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of retained entries (for tests).
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().map(|s| s.0.len()).unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl HistoryProvider for MemoryHistory {
    fn push(&self, entry: HistoryEntry) -> anyhow::Result<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| anyhow::anyhow!("history lock poisoned"))?;
        let cursor = state.1.map(|i| i + 1).unwrap_or(0);
        state.0.truncate(cursor);
        state.0.push(entry);
        state.1 = Some(state.0.len() - 1);
        Ok(())
    }

    fn replace(&self, entry: HistoryEntry) -> anyhow::Result<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| anyhow::anyhow!("history lock poisoned"))?;
        match state.1 {
            Some(i) => state.0[i] = entry,
            None => {
                state.0.push(entry);
                state.1 = Some(0);
            }
        }
        Ok(())
    }

    fn back(&self) -> Option<HistoryEntry> {
        let mut state = self.state.lock().ok()?;
        let i = state.1?;
        if i == 0 {
            return None;
        }
        state.1 = Some(i - 1);
        state.0.get(i - 1).cloned()
    }

    fn forward(&self) -> Option<HistoryEntry> {
        let mut state = self.state.lock().ok()?;
        let i = state.1?;
        if i + 1 >= state.0.len() {
            return None;
        }
        state.1 = Some(i + 1);
        state.0.get(i + 1).cloned()
    }

    fn current(&self) -> Option<HistoryEntry> {
        let state = self.state.lock().ok()?;
        let i = state.1?;
        state.0.get(i).cloned()
    }
}

/// In-memory string KV store.
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageProvider for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.entries
            .lock()
            .map_err(|_| anyhow::anyhow!("storage lock poisoned"))?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(key);
        }
    }
}

/// In-memory scroll state. Records the last `scroll_into_view` target so
/// tests can assert fragment navigation.
#[derive(Default)]
pub struct MemoryScroll {
    offset: Mutex<ScrollOffset>,
    last_into_view: Mutex<Option<String>>,
}

impl MemoryScroll {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Last fragment scrolled into view (for tests).
    #[must_use]
    pub fn last_into_view(&self) -> Option<String> {
        self.last_into_view.lock().ok()?.clone()
    }

    /// Set the simulated viewport offset (for tests).
    pub fn set_offset(&self, offset: ScrollOffset) {
        if let Ok(mut o) = self.offset.lock() {
            *o = offset;
        }
    }
}

impl ScrollProvider for MemoryScroll {
    fn current_offset(&self) -> ScrollOffset {
        self.offset.lock().map(|o| *o).unwrap_or_default()
    }

    fn scroll_to(&self, offset: ScrollOffset) {
        if let Ok(mut o) = self.offset.lock() {
            *o = offset;
        }
    }

    fn scroll_into_view(&self, fragment: &str) {
        if let Ok(mut last) = self.last_into_view.lock() {
            *last = Some(fragment.to_string());
        }
    }

    fn after_paint(&self, f: Box<dyn FnOnce() + Send>) {
        // No paint cycle in memory; run immediately.
        f();
    }
}

/// In-memory DOM: a set of registered element ids.
#[derive(Default)]
pub struct MemoryDom {
    ids: Mutex<HashSet<String>>,
}

impl MemoryDom {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an element id (for tests).
    pub fn register(&self, id: impl Into<String>) {
        if let Ok(mut ids) = self.ids.lock() {
            ids.insert(id.into());
        }
    }
}

impl DomProvider for MemoryDom {
    fn element_exists(&self, id: &str) -> bool {
        self.ids.lock().map(|ids| ids.contains(id)).unwrap_or(false)
    }
}
