//! Route definitions and the immutable authoring builder.
//!
//! A [`RouteDefinition`] is produced once at app composition and never
//! mutated afterwards: every builder call consumes the definition and
//! returns a new one with the field applied. The invariant that a node has
//! either a component or children (never both) is enforced when the
//! definition tree is assembled into a [`crate::route::RouteTable`].

use crate::content::Renderable;
use crate::decode::{Decoder, DecoderMap};
use crate::middleware::{Middleware, PrefetchTask};
use crate::nav::ScrollStrategy;
use crate::outlet::LoadingPolicy;
use crate::service::ServiceModule;
use std::sync::Arc;

/// Declaratively authored route node.
///
/// Built with the fluent constructors below:
///
/// ```rust,ignore
/// use wayfarer::route::RouteDefinition;
/// use wayfarer::content::{Content, Renderable};
///
/// let routes = vec![RouteDefinition::path("users")
///     .layout(Renderable::inline(Content::element("section", vec![])))
///     .child(RouteDefinition::index().component(Renderable::inline(Content::text("all users"))))
///     .child(RouteDefinition::path(":id").component(Renderable::inline(Content::text("one user"))))];
/// ```
#[derive(Clone, Default)]
pub struct RouteDefinition {
    path: Option<String>,
    component: Option<Renderable>,
    layout: Option<Renderable>,
    loading: Option<Renderable>,
    error: Option<Renderable>,
    not_found: Option<Renderable>,
    forbidden: Option<Renderable>,
    middleware: Vec<Arc<dyn Middleware>>,
    prefetch: Vec<Arc<dyn PrefetchTask>>,
    children: Vec<RouteDefinition>,
    param_decoders: DecoderMap,
    query_decoders: DecoderMap,
    scroll: ScrollStrategy,
    loading_policy: LoadingPolicy,
    services: Vec<Arc<dyn ServiceModule>>,
}

impl RouteDefinition {
    /// Route with a relative path segment (may contain params, e.g.
    /// `users/:id`).
    #[must_use]
    pub fn path(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Index route: matches its parent's path exactly, contributing no
    /// segment of its own.
    #[must_use]
    pub fn index() -> Self {
        Self::default()
    }

    /// Leaf content rendered when this route matches.
    #[must_use]
    pub fn component(mut self, component: Renderable) -> Self {
        self.component = Some(component);
        self
    }

    /// Layout wrapped around this route's subtree.
    #[must_use]
    pub fn layout(mut self, layout: Renderable) -> Self {
        self.layout = Some(layout);
        self
    }

    /// Loading boundary shown while async renders are in flight.
    #[must_use]
    pub fn loading(mut self, loading: Renderable) -> Self {
        self.loading = Some(loading);
        self
    }

    /// Error boundary for render and middleware domain errors.
    #[must_use]
    pub fn error(mut self, error: Renderable) -> Self {
        self.error = Some(error);
        self
    }

    /// Not-found boundary. Only honored on table roots.
    #[must_use]
    pub fn not_found(mut self, not_found: Renderable) -> Self {
        self.not_found = Some(not_found);
        self
    }

    /// Forbidden boundary for middleware `Forbidden` results.
    #[must_use]
    pub fn forbidden(mut self, forbidden: Renderable) -> Self {
        self.forbidden = Some(forbidden);
        self
    }

    /// Append an access-control middleware task. Tasks run in authoring
    /// order, ancestors before descendants.
    #[must_use]
    pub fn middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middleware.push(middleware);
        self
    }

    /// Append a prefetch task, fired concurrently and best-effort when the
    /// route activates.
    #[must_use]
    pub fn prefetch(mut self, task: Arc<dyn PrefetchTask>) -> Self {
        self.prefetch.push(task);
        self
    }

    /// Append a child route.
    #[must_use]
    pub fn child(mut self, child: RouteDefinition) -> Self {
        self.children.push(child);
        self
    }

    /// Append several child routes.
    #[must_use]
    pub fn children(mut self, children: Vec<RouteDefinition>) -> Self {
        self.children.extend(children);
        self
    }

    /// Declare a decoder for a named path parameter.
    #[must_use]
    pub fn param_decoder(mut self, name: impl Into<String>, decoder: Arc<dyn Decoder>) -> Self {
        self.param_decoders.insert(name.into(), decoder);
        self
    }

    /// Declare a decoder for a named query field.
    #[must_use]
    pub fn query_decoder(mut self, name: impl Into<String>, decoder: Arc<dyn Decoder>) -> Self {
        self.query_decoders.insert(name.into(), decoder);
        self
    }

    /// Scroll strategy applied when this route renders.
    #[must_use]
    pub fn scroll_strategy(mut self, scroll: ScrollStrategy) -> Self {
        self.scroll = scroll;
        self
    }

    /// Loading-boundary presentation policy.
    #[must_use]
    pub fn loading_policy(mut self, policy: LoadingPolicy) -> Self {
        self.loading_policy = policy;
        self
    }

    /// Declare a service module injected while this route is active.
    #[must_use]
    pub fn service(mut self, module: Arc<dyn ServiceModule>) -> Self {
        self.services.push(module);
        self
    }

    // Accessors used by the resolver, boundary resolver, and outlet.

    /// Relative path segment; `None` marks an index route.
    #[must_use]
    pub fn relative_path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Whether this is an index route.
    #[must_use]
    pub fn is_index(&self) -> bool {
        self.path.is_none()
    }

    #[must_use]
    pub fn get_component(&self) -> Option<&Renderable> {
        self.component.as_ref()
    }

    #[must_use]
    pub fn get_layout(&self) -> Option<&Renderable> {
        self.layout.as_ref()
    }

    #[must_use]
    pub fn get_loading(&self) -> Option<&Renderable> {
        self.loading.as_ref()
    }

    #[must_use]
    pub fn get_error(&self) -> Option<&Renderable> {
        self.error.as_ref()
    }

    #[must_use]
    pub fn get_not_found(&self) -> Option<&Renderable> {
        self.not_found.as_ref()
    }

    #[must_use]
    pub fn get_forbidden(&self) -> Option<&Renderable> {
        self.forbidden.as_ref()
    }

    #[must_use]
    pub fn middleware_tasks(&self) -> &[Arc<dyn Middleware>] {
        &self.middleware
    }

    #[must_use]
    pub fn prefetch_tasks(&self) -> &[Arc<dyn PrefetchTask>] {
        &self.prefetch
    }

    #[must_use]
    pub fn child_routes(&self) -> &[RouteDefinition] {
        &self.children
    }

    #[must_use]
    pub fn param_decoders(&self) -> &DecoderMap {
        &self.param_decoders
    }

    #[must_use]
    pub fn query_decoders(&self) -> &DecoderMap {
        &self.query_decoders
    }

    #[must_use]
    pub fn scroll(&self) -> ScrollStrategy {
        self.scroll
    }

    #[must_use]
    pub fn get_loading_policy(&self) -> LoadingPolicy {
        self.loading_policy
    }

    #[must_use]
    pub fn service_modules(&self) -> &[Arc<dyn ServiceModule>] {
        &self.services
    }
}

impl std::fmt::Debug for RouteDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteDefinition")
            .field("path", &self.path)
            .field("has_component", &self.component.is_some())
            .field("has_layout", &self.layout.is_some())
            .field("middleware", &self.middleware.len())
            .field("children", &self.children.len())
            .finish()
    }
}
