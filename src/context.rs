//! # Execution-Scoped Router Context
//!
//! "Current router" access from anywhere in the render tree, without a
//! naked global singleton. A [`NavScope`] is created once at composition
//! time and entered on the execution stream that runs render cycles;
//! forked coroutines receive a cloned scope and re-enter it themselves, so
//! the context travels with the work rather than living in process-global
//! state. Tests install their own scope and never bleed into each other.

use crate::nav::NavigationController;
use std::cell::RefCell;
use std::sync::Arc;

thread_local! {
    static CURRENT: RefCell<Vec<Arc<NavigationController>>> = const { RefCell::new(Vec::new()) };
}

/// Cloneable handle carrying a navigation controller into forked tasks.
#[derive(Clone)]
pub struct NavScope {
    controller: Arc<NavigationController>,
}

impl NavScope {
    /// Create a scope for `controller`.
    #[must_use]
    pub fn new(controller: Arc<NavigationController>) -> Self {
        Self { controller }
    }

    /// The controller this scope carries.
    #[must_use]
    pub fn controller(&self) -> Arc<NavigationController> {
        Arc::clone(&self.controller)
    }

    /// Install this scope on the current execution stream.
    ///
    /// Returns a guard; the scope stays active until the guard drops.
    /// Scopes nest, so a test can shadow an outer scope temporarily.
    #[must_use]
    pub fn enter(&self) -> ScopeGuard {
        CURRENT.with(|stack| {
            stack.borrow_mut().push(Arc::clone(&self.controller));
        });
        ScopeGuard { _priv: () }
    }
}

impl std::fmt::Debug for NavScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("NavScope")
    }
}

/// Keeps a [`NavScope`] active; pops it when dropped.
pub struct ScopeGuard {
    _priv: (),
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        CURRENT.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

/// The controller installed on the current execution stream, if any.
#[must_use]
pub fn current() -> Option<Arc<NavigationController>> {
    CURRENT.with(|stack| stack.borrow().last().map(Arc::clone))
}
