//! # Reactive Cell Module
//!
//! Minimal reactive-state primitive consumed by the navigation engine.
//!
//! A [`Cell`] is a shared, observable slot holding a single value. It backs
//! every piece of mutable navigation state: the controller's current path and
//! query, derived `is_active` booleans, and each outlet's published content.
//!
//! ## Contract
//!
//! - `new` creates a cell, `get` returns a snapshot of the last fully
//!   published value, `set` publishes a new value and notifies subscribers,
//!   `subscribe` registers a listener, `derive` produces a mapped child cell
//!   kept in sync with its parent.
//! - Reads never tear: the value lives behind an `ArcSwap`, so concurrent
//!   readers always observe the last complete publish, never a partial write.
//! - Listeners run after the value is swapped in and outside the subscriber
//!   lock, so a listener may freely read or even set the cell it observes.

use arc_swap::ArcSwap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use tracing::warn;

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct CellInner<T> {
    value: ArcSwap<T>,
    listeners: Mutex<Vec<(u64, Listener<T>)>>,
    next_listener_id: AtomicU64,
}

/// Shared reactive slot holding a single observable value.
///
/// Cloning a `Cell` clones the handle, not the value: all clones observe and
/// mutate the same underlying state.
pub struct Cell<T> {
    inner: Arc<CellInner<T>>,
}

impl<T> Clone for Cell<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Send + Sync + 'static> Cell<T> {
    /// Create a new cell holding `value`.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(CellInner {
                value: ArcSwap::from_pointee(value),
                listeners: Mutex::new(Vec::new()),
                next_listener_id: AtomicU64::new(0),
            }),
        }
    }

    /// Snapshot of the last fully published value.
    #[must_use]
    pub fn get(&self) -> Arc<T> {
        self.inner.value.load_full()
    }

    /// Publish a new value and notify every subscriber.
    ///
    /// The swap is atomic; listeners are invoked afterwards with a snapshot,
    /// outside the subscriber lock.
    pub fn set(&self, value: T) {
        let snapshot = Arc::new(value);
        self.inner.value.store(Arc::clone(&snapshot));

        let listeners: Vec<Listener<T>> = match self.inner.listeners.lock() {
            Ok(guard) => guard.iter().map(|(_, l)| Arc::clone(l)).collect(),
            Err(poisoned) => {
                warn!("cell listener lock poisoned, notifying anyway");
                poisoned
                    .into_inner()
                    .iter()
                    .map(|(_, l)| Arc::clone(l))
                    .collect()
            }
        };
        for listener in listeners {
            listener(&snapshot);
        }
    }

    /// Register a listener invoked on every publish.
    ///
    /// The listener stays attached until [`Subscription::unsubscribe`] is
    /// called; dropping the returned guard does not detach it.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = self.inner.next_listener_id.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut guard) = self.inner.listeners.lock() {
            guard.push((id, Arc::new(listener)));
        }
        let inner = Arc::downgrade(&self.inner);
        Subscription {
            id,
            detach: Some(Box::new(move || {
                if let Some(inner) = inner.upgrade() {
                    if let Ok(mut guard) = inner.listeners.lock() {
                        guard.retain(|(lid, _)| *lid != id);
                    }
                }
            })),
        }
    }

    /// Create a child cell whose value is `map(parent)` and is republished
    /// whenever the parent changes.
    #[must_use]
    pub fn derive<U, F>(&self, map: F) -> Cell<U>
    where
        U: Send + Sync + 'static,
        F: Fn(&T) -> U + Send + Sync + 'static,
    {
        let derived = Cell::new(map(&self.get()));
        let sink = derived.clone();
        // The parent keeps the listener (and thus the child) alive for as
        // long as the parent itself lives.
        let _sub = self.subscribe(move |value| sink.set(map(value)));
        derived
    }
}

/// Handle to a registered listener.
///
/// Holds a weak reference back to the cell, so an outstanding subscription
/// never keeps state alive on its own.
pub struct Subscription {
    #[allow(dead_code)]
    id: u64,
    detach: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Detach the listener from its cell.
    pub fn unsubscribe(mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_cell_get_set() {
        let cell = Cell::new(1u32);
        assert_eq!(*cell.get(), 1);
        cell.set(2);
        assert_eq!(*cell.get(), 2);
    }

    #[test]
    fn test_cell_subscribe_notifies() {
        let cell = Cell::new(0u32);
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_clone = Arc::clone(&seen);
        let _sub = cell.subscribe(move |v| {
            seen_clone.store(*v as usize, Ordering::SeqCst);
        });
        cell.set(7);
        assert_eq!(seen.load(Ordering::SeqCst), 7);
    }

    #[test]
    fn test_cell_unsubscribe_stops_notifications() {
        let cell = Cell::new(0u32);
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = Arc::clone(&count);
        let sub = cell.subscribe(move |_| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });
        cell.set(1);
        sub.unsubscribe();
        cell.set(2);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cell_derive_tracks_parent() {
        let path = Cell::new("/users".to_string());
        let active = path.derive(|p| p == "/users");
        assert!(*active.get());
        path.set("/posts".to_string());
        assert!(!*active.get());
        path.set("/users".to_string());
        assert!(*active.get());
    }

    #[test]
    fn test_cell_listener_may_set_same_cell() {
        let cell = Cell::new(0u32);
        let clamp = cell.clone();
        let _sub = cell.subscribe(move |v| {
            if *v > 10 {
                clamp.set(10);
            }
        });
        cell.set(42);
        assert_eq!(*cell.get(), 10);
    }
}
