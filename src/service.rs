//! # Service Module Provisioning
//!
//! Routes can declare service modules that are injected while the route is
//! active. The outlet collects the modules declared by the matched route and
//! all of its ancestors, root-to-leaf, into a [`ServiceRegistry`] exposed on
//! the render context. Leaf declarations shadow ancestor declarations under
//! the same name.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

/// A capability provider scoped to a route subtree.
///
/// `provide` is called once per render cycle for the active route chain and
/// may register any number of entries.
pub trait ServiceModule: Send + Sync {
    /// Stable module name, used for logging.
    fn name(&self) -> &str;

    /// Register this module's services.
    fn provide(&self, registry: &mut ServiceRegistry);
}

/// String-keyed registry of type-erased services.
#[derive(Clone, Default)]
pub struct ServiceRegistry {
    entries: HashMap<String, Arc<dyn Any + Send + Sync>>,
}

impl ServiceRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a service under `key`, replacing any previous entry.
    pub fn insert<T: Send + Sync + 'static>(&mut self, key: impl Into<String>, value: T) {
        self.entries.insert(key.into(), Arc::new(value));
    }

    /// Fetch a service by key and concrete type.
    #[must_use]
    pub fn get<T: Send + Sync + 'static>(&self, key: &str) -> Option<Arc<T>> {
        let entry = self.entries.get(key)?;
        Arc::clone(entry).downcast::<T>().ok()
    }

    /// Whether a service is registered under `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of registered services.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field("keys", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}
