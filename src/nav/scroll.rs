//! Scroll persistence and restore.
//!
//! Every navigation entry carries an opaque scroll key. Before leaving a
//! page the current offset is persisted under that key; on arrival the
//! strategy below decides what the viewport does. Application is deferred
//! until after the next paint so it runs once the outlet's DOM update has
//! landed. All of it is best-effort: storage or scroll failures are
//! logged and ignored.

use super::controller::NavigationContext;
use crate::platform::Platform;
use tracing::{debug, warn};

/// Per-route scroll behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollStrategy {
    /// Fragment into view, popstate restores the saved offset, otherwise
    /// scroll to top.
    #[default]
    Auto,
    /// Always scroll to top.
    Top,
    /// Leave the viewport where it is.
    Preserve,
}

/// Storage key namespacing a scroll key.
pub(crate) fn storage_key(scroll_key: &str) -> String {
    format!("wayfarer.scroll.{scroll_key}")
}

/// Persist the current viewport offset under `scroll_key`.
pub(crate) fn persist_offset(platform: &Platform, scroll_key: &str) {
    let offset = platform.scroll.current_offset();
    match serde_json::to_string(&offset) {
        Ok(json) => {
            if let Err(e) = platform.storage.set(&storage_key(scroll_key), &json) {
                warn!(scroll_key = %scroll_key, error = %e, "Failed to persist scroll offset");
            }
        }
        Err(e) => {
            warn!(scroll_key = %scroll_key, error = %e, "Failed to serialize scroll offset");
        }
    }
}

/// Apply the route's scroll strategy for the navigation described by
/// `ctx`, after the next paint.
pub(crate) fn apply(platform: &Platform, strategy: ScrollStrategy, ctx: &NavigationContext) {
    if strategy == ScrollStrategy::Preserve {
        return;
    }

    let scroll = std::sync::Arc::clone(&platform.scroll);
    let storage = std::sync::Arc::clone(&platform.storage);
    let dom = std::sync::Arc::clone(&platform.dom);
    let ctx = ctx.clone();
    let scroll_for_paint = std::sync::Arc::clone(&scroll);

    scroll.after_paint(Box::new(move || {
        let scroll = scroll_for_paint;
        if strategy == ScrollStrategy::Auto {
            if let Some(hash) = ctx.hash.as_deref() {
                if dom.element_exists(hash) {
                    debug!(fragment = %hash, "Scrolling fragment into view");
                    scroll.scroll_into_view(hash);
                    return;
                }
            }
            if ctx.is_popstate {
                if let Some(json) = storage.get(&storage_key(&ctx.scroll_key)) {
                    match serde_json::from_str(&json) {
                        Ok(offset) => {
                            debug!(scroll_key = %ctx.scroll_key, "Restoring scroll offset");
                            scroll.scroll_to(offset);
                            return;
                        }
                        Err(e) => {
                            warn!(
                                scroll_key = %ctx.scroll_key,
                                error = %e,
                                "Persisted scroll offset unreadable"
                            );
                        }
                    }
                }
            }
        }
        scroll.scroll_to(crate::platform::ScrollOffset::default());
    }));
}
