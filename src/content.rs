//! # Renderable Content Module
//!
//! The content primitive the outlet composes and publishes. The real DOM
//! renderer and diffing live outside this crate; navigation only needs a
//! tree it can build, wrap in layouts, and hand to the host renderer.
//!
//! Three descriptor shapes cover every way a route can deliver content:
//!
//! - [`Renderable::Inline`] - content authored directly on the route
//! - [`Renderable::Render`] - a render function invoked with the active
//!   [`RenderContext`]; it runs inside a coroutine and may suspend
//! - [`Renderable::Lazy`] - a deferred loader for code-split delivery,
//!   resolving to another `Renderable`
//!
//! Lazy-load failures are treated exactly like render failures: they
//! surface through the nearest error boundary, never as a crash.

use crate::service::ServiceRegistry;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Renderable markup tree published into an outlet's output cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    /// Nothing to render.
    Empty,
    /// Plain text node.
    Text(String),
    /// Named element with ordered children.
    Element {
        /// Element tag name (e.g. `div`, `main`).
        tag: String,
        /// Child nodes in document order.
        children: Vec<Content>,
    },
    /// Sequence of sibling nodes with no wrapping element.
    Fragment(Vec<Content>),
}

impl Content {
    /// Text node helper.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Content::Text(text.into())
    }

    /// Element node helper.
    #[must_use]
    pub fn element(tag: impl Into<String>, children: Vec<Content>) -> Self {
        Content::Element {
            tag: tag.into(),
            children,
        }
    }

    /// Concatenated text of the whole subtree.
    ///
    /// Mostly useful in tests and default boundary content.
    #[must_use]
    pub fn flat_text(&self) -> String {
        match self {
            Content::Empty => String::new(),
            Content::Text(t) => t.clone(),
            Content::Element { children, .. } | Content::Fragment(children) => {
                children.iter().map(Content::flat_text).collect()
            }
        }
    }
}

impl Default for Content {
    fn default() -> Self {
        Content::Empty
    }
}

/// Render function signature: runs with the active context, may suspend
/// inside its coroutine, and either produces content or fails.
pub type RenderFn = Arc<dyn Fn(&RenderContext) -> anyhow::Result<Content> + Send + Sync>;

/// Deferred module loader for code-split routes.
pub type LazyLoader = Arc<dyn Fn() -> anyhow::Result<Renderable> + Send + Sync>;

/// Descriptor for content a route can deliver.
#[derive(Clone)]
pub enum Renderable {
    /// Inline content, rendered as-is.
    Inline(Content),
    /// Render function invoked per cycle.
    Render(RenderFn),
    /// Deferred loader resolving to another renderable.
    Lazy(LazyLoader),
}

impl Renderable {
    /// Inline content descriptor.
    #[must_use]
    pub fn inline(content: Content) -> Self {
        Renderable::Inline(content)
    }

    /// Render-function descriptor.
    #[must_use]
    pub fn render<F>(f: F) -> Self
    where
        F: Fn(&RenderContext) -> anyhow::Result<Content> + Send + Sync + 'static,
    {
        Renderable::Render(Arc::new(f))
    }

    /// Deferred-loader descriptor.
    #[must_use]
    pub fn lazy<F>(f: F) -> Self
    where
        F: Fn() -> anyhow::Result<Renderable> + Send + Sync + 'static,
    {
        Renderable::Lazy(Arc::new(f))
    }

    /// Resolve this descriptor to concrete content.
    ///
    /// Lazy descriptors chase the loader until an inline or render
    /// descriptor is produced. Any failure (loader or render) is a render
    /// error for the caller to route to the nearest error boundary.
    pub fn resolve(&self, ctx: &RenderContext) -> anyhow::Result<Content> {
        match self {
            Renderable::Inline(content) => Ok(content.clone()),
            Renderable::Render(f) => f(ctx),
            Renderable::Lazy(loader) => loader()?.resolve(ctx),
        }
    }
}

impl std::fmt::Debug for Renderable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Renderable::Inline(c) => f.debug_tuple("Inline").field(c).finish(),
            Renderable::Render(_) => f.write_str("Render(..)"),
            Renderable::Lazy(_) => f.write_str("Lazy(..)"),
        }
    }
}

/// Callback handed to error-boundary content so the host can retry the
/// failed render cycle.
#[derive(Clone)]
pub struct ResetHandle {
    reset: Arc<dyn Fn() + Send + Sync>,
}

impl ResetHandle {
    pub(crate) fn new(reset: Arc<dyn Fn() + Send + Sync>) -> Self {
        Self { reset }
    }

    /// Re-run the outlet's render cycle.
    pub fn reset(&self) {
        (self.reset)();
    }
}

impl std::fmt::Debug for ResetHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ResetHandle")
    }
}

/// Everything a render function can see: decoded params and query, their
/// raw string forms, the services collected for the active route, staged
/// nested content for layout composition, and (for boundary content) the
/// failure that brought it on screen.
#[derive(Debug, Default)]
pub struct RenderContext {
    path: String,
    params: HashMap<String, Value>,
    raw_params: HashMap<String, String>,
    query: HashMap<String, Value>,
    raw_query: HashMap<String, String>,
    services: ServiceRegistry,
    nested: Mutex<Option<Content>>,
    failure: Option<String>,
    reset: Option<ResetHandle>,
}

impl RenderContext {
    /// Context with nothing in scope. Used for placeholder and root
    /// not-found renders, and handy in tests.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        path: String,
        params: HashMap<String, Value>,
        raw_params: HashMap<String, String>,
        query: HashMap<String, Value>,
        raw_query: HashMap<String, String>,
        services: ServiceRegistry,
    ) -> Self {
        Self {
            path,
            params,
            raw_params,
            query,
            raw_query,
            services,
            nested: Mutex::new(None),
            failure: None,
            reset: None,
        }
    }

    pub(crate) fn with_failure(mut self, failure: String) -> Self {
        self.failure = Some(failure);
        self
    }

    pub(crate) fn with_reset(mut self, reset: ResetHandle) -> Self {
        self.reset = Some(reset);
        self
    }

    /// The matched absolute path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Decoded path parameter. Falls back to the raw string value when the
    /// route declared no decoder (or decoding failed).
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    /// Raw, undecoded path parameter as extracted from the URL.
    #[must_use]
    pub fn raw_param(&self, name: &str) -> Option<&str> {
        self.raw_params.get(name).map(String::as_str)
    }

    /// Decoded query value (raw string fallback, same as params).
    #[must_use]
    pub fn query(&self, name: &str) -> Option<&Value> {
        self.query.get(name)
    }

    /// Raw query value.
    #[must_use]
    pub fn raw_query(&self, name: &str) -> Option<&str> {
        self.raw_query.get(name).map(String::as_str)
    }

    /// Services collected root-to-leaf for the active route.
    #[must_use]
    pub fn services(&self) -> &ServiceRegistry {
        &self.services
    }

    /// Failure description when rendering boundary content, `None` during
    /// a normal render.
    #[must_use]
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Reset affordance for error-boundary content.
    #[must_use]
    pub fn reset_handle(&self) -> Option<&ResetHandle> {
        self.reset.as_ref()
    }

    /// Stage content for the next-inner consumer. Layouts receive their
    /// child this way instead of as a direct argument, so a layout can be
    /// authored without knowing its child's type.
    pub fn stage_nested(&self, content: Content) {
        if let Ok(mut slot) = self.nested.lock() {
            *slot = Some(content);
        }
    }

    /// Consume the staged nested content, if any.
    #[must_use]
    pub fn take_nested(&self) -> Option<Content> {
        self.nested.lock().ok().and_then(|mut slot| slot.take())
    }
}
