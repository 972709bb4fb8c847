//! The outlet: the render surface that turns navigation state into
//! published content.
//!
//! An outlet subscribes to its controller's path cell and re-runs its
//! render cycle on every publish. One cycle is: resolve the table, match
//! the path, run middleware, decode fields, fire prefetch, collect
//! services, compose the component inside its layout chain, route any
//! failure to the nearest boundary, present (synchronously or through the
//! async loader), then apply the route's scroll strategy. A cycle never
//! panics out: a faulted cycle leaves the previously published content on
//! screen.

use super::loader::AsyncLoader;
use crate::boundary::{
    default_boundary_content, default_not_found_content, BoundaryKind, BoundaryResolver,
};
use crate::content::{Content, RenderContext, Renderable, ResetHandle};
use crate::context::NavScope;
use crate::decode::{decode_fields, DecoderMap};
use crate::matcher::Matcher;
use crate::middleware::{fire_prefetch, run_pipeline, MiddlewareResult, NavRequest};
use crate::nav::{NavigateOptions, NavigationController};
use crate::reactive::{Cell, Subscription};
use crate::route::{ResolvedRoute, RouteTable};
use crate::service::ServiceRegistry;
use once_cell::sync::OnceCell;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Weak};
use tracing::{debug, error, info, warn};

/// Middleware redirects a single navigation may chain through before the
/// outlet gives up and renders the error boundary.
const MAX_REDIRECT_HOPS: usize = 8;

/// A mounted render surface bound to a navigation controller.
///
/// Cloning an `Outlet` clones the handle; all clones publish into the
/// same output cell.
#[derive(Clone)]
pub struct Outlet {
    inner: Arc<OutletInner>,
}

struct OutletInner {
    controller: Arc<NavigationController>,
    explicit_table: Option<Arc<RouteTable>>,
    matcher_cache: Mutex<Option<(u64, Arc<Matcher>)>>,
    loader: OnceCell<Arc<AsyncLoader>>,
    output: Cell<Content>,
    staged: Mutex<Option<Content>>,
    subscription: Mutex<Option<Subscription>>,
    redirect_hops: AtomicUsize,
}

impl Outlet {
    /// Outlet using the controller's ambient route table.
    #[must_use]
    pub fn new(controller: Arc<NavigationController>) -> Self {
        Self::build(controller, None)
    }

    /// Outlet with its own route table, overriding the ambient one.
    #[must_use]
    pub fn with_table(controller: Arc<NavigationController>, table: Arc<RouteTable>) -> Self {
        Self::build(controller, Some(table))
    }

    fn build(controller: Arc<NavigationController>, table: Option<Arc<RouteTable>>) -> Self {
        Self {
            inner: Arc::new(OutletInner {
                controller,
                explicit_table: table,
                matcher_cache: Mutex::new(None),
                loader: OnceCell::new(),
                output: Cell::new(Content::Empty),
                staged: Mutex::new(None),
                subscription: Mutex::new(None),
                redirect_hops: AtomicUsize::new(0),
            }),
        }
    }

    /// Subscribe to navigation changes and render the current location.
    ///
    /// Idempotent; a second mount replaces the previous subscription.
    pub fn mount(&self) {
        let weak = Arc::downgrade(&self.inner);
        let sub = self
            .inner
            .controller
            .path_cell()
            .subscribe(move |_path: &String| {
                if let Some(inner) = weak.upgrade() {
                    inner.render_cycle();
                }
            });
        if let Ok(mut slot) = self.inner.subscription.lock() {
            if let Some(previous) = slot.replace(sub) {
                previous.unsubscribe();
            }
        }
        self.inner.render_cycle();
    }

    /// Detach from the controller. The last published content remains in
    /// the output cell.
    pub fn unmount(&self) {
        if let Ok(mut slot) = self.inner.subscription.lock() {
            if let Some(sub) = slot.take() {
                sub.unsubscribe();
            }
        }
    }

    /// The cell this outlet publishes rendered content into.
    #[must_use]
    pub fn output(&self) -> Cell<Content> {
        self.inner.output.clone()
    }

    /// Stage content to publish verbatim on the next cycle, bypassing
    /// matching. Used by an enclosing layout to hand a nested outlet its
    /// already-composed child.
    pub fn stage_nested(&self, content: Content) {
        if let Ok(mut slot) = self.inner.staged.lock() {
            *slot = Some(content);
        }
    }

    /// Re-run the render cycle for the current location.
    pub fn refresh(&self) {
        self.inner.render_cycle();
    }
}

impl std::fmt::Debug for Outlet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Outlet")
    }
}

impl OutletInner {
    /// One render cycle. Contained: a fault anywhere inside leaves the
    /// previously published content on screen.
    fn render_cycle(self: &Arc<Self>) {
        let outcome = catch_unwind(AssertUnwindSafe(|| self.run_cycle()));
        if let Err(panic) = outcome {
            error!(
                panic_message = ?panic_text(&panic),
                "Render cycle panicked, keeping previous content"
            );
        }
    }

    fn run_cycle(self: &Arc<Self>) {
        let scope = NavScope::new(Arc::clone(&self.controller));
        let _guard = scope.enter();

        if let Ok(mut slot) = self.staged.lock() {
            if let Some(content) = slot.take() {
                debug!("Publishing staged nested content");
                self.output.set(content);
                return;
            }
        }

        let Some(table) = self
            .explicit_table
            .clone()
            .or_else(|| self.controller.table())
        else {
            warn!("Outlet has no route table");
            self.output.set(Content::text("no routes configured"));
            return;
        };
        if table.is_empty() {
            warn!(table_id = table.id(), "Route table is empty");
            self.output.set(Content::text("no routes configured"));
            return;
        }

        let Some(matcher) = self.matcher_for(&table) else {
            return;
        };

        let path = self.controller.current_path();
        let raw_query = self.controller.current_query();

        let Some(m) = matcher.match_path(&path) else {
            self.redirect_hops.store(0, Ordering::SeqCst);
            let resolver = BoundaryResolver::new(Arc::clone(&table));
            let content = match resolver.not_found() {
                Some(renderable) => renderable
                    .resolve(&RenderContext::empty())
                    .unwrap_or_else(|e| {
                        warn!(error = %e, "Not-found boundary failed, using default");
                        default_not_found_content()
                    }),
                None => default_not_found_content(),
            };
            info!(path = %path, "No route matched, rendering not-found boundary");
            self.output.set(content);
            return;
        };

        let route = Arc::clone(&m.route);
        let req = NavRequest::from_match(&path, &m, raw_query.clone());
        match run_pipeline(&route, &req) {
            MiddlewareResult::Continue => {
                self.redirect_hops.store(0, Ordering::SeqCst);
            }
            MiddlewareResult::Redirect {
                path: target,
                replace,
            } => {
                self.follow_redirect(&table, &route, &path, &target, replace);
                return;
            }
            MiddlewareResult::Forbidden => {
                self.redirect_hops.store(0, Ordering::SeqCst);
                let resolver = BoundaryResolver::new(Arc::clone(&table));
                self.publish_boundary(&resolver, &route, BoundaryKind::Forbidden, None);
                return;
            }
            MiddlewareResult::Error { cause } => {
                self.redirect_hops.store(0, Ordering::SeqCst);
                let resolver = BoundaryResolver::new(Arc::clone(&table));
                self.publish_boundary(
                    &resolver,
                    &route,
                    BoundaryKind::Error,
                    Some(cause.to_string()),
                );
                return;
            }
        }

        fire_prefetch(&route, &req, NavScope::new(Arc::clone(&self.controller)));

        let raw_params = m.params_map();
        let (param_decoders, query_decoders) = collect_decoders(&route);
        let params = decode_fields(&param_decoders, &raw_params);
        let query = decode_fields(&query_decoders, &raw_query);
        let services = collect_services(&route);

        let ctx = RenderContext::new(
            path.clone(),
            params,
            raw_params.clone(),
            query,
            raw_query.clone(),
            services,
        );

        let resolver = BoundaryResolver::new(Arc::clone(&table));
        let error_boundary = resolver.resolve(&route, BoundaryKind::Error);
        let reset = self.reset_handle();
        let compose = composer(&route, ctx, error_boundary, reset);

        let loading_boundary = resolver.resolve(&route, BoundaryKind::Loading);
        match loading_boundary {
            Some(boundary) => {
                let fallback = boundary
                    .resolve(&RenderContext::empty())
                    .unwrap_or_else(|e| {
                        warn!(error = %e, "Loading boundary failed, using default");
                        default_boundary_content(BoundaryKind::Loading)
                    });
                let key = AsyncLoader::match_key(&path, &raw_params, &raw_query);
                let scope = NavScope::new(Arc::clone(&self.controller));
                let loader = self.loader.get_or_init(AsyncLoader::new);
                loader.present(
                    key,
                    Box::new(move || {
                        let _guard = scope.enter();
                        compose()
                    }),
                    fallback,
                    route.definition.get_loading_policy(),
                    self.output.clone(),
                );
            }
            None => {
                self.output.set(compose());
            }
        }

        self.controller.apply_scroll(route.definition.scroll());
    }

    /// Follow a middleware redirect, refusing a redirect back to the path
    /// that produced it.
    ///
    /// Each hop of a redirect chain re-enters the render cycle through
    /// `navigate`, so the chain length is budgeted: once it exceeds
    /// [`MAX_REDIRECT_HOPS`] the outlet stops following and renders the
    /// error boundary instead of recursing forever.
    fn follow_redirect(
        self: &Arc<Self>,
        table: &Arc<RouteTable>,
        route: &Arc<ResolvedRoute>,
        from: &str,
        target: &str,
        replace: bool,
    ) {
        let (target_base, _, _) = crate::nav::split_location(target);
        if target_base == from {
            self.redirect_hops.store(0, Ordering::SeqCst);
            error!(
                path = %from,
                redirect_to = %target,
                "Middleware redirect loops back to its own path, ignoring"
            );
            return;
        }
        let hops = self.redirect_hops.fetch_add(1, Ordering::SeqCst) + 1;
        if hops > MAX_REDIRECT_HOPS {
            self.redirect_hops.store(0, Ordering::SeqCst);
            error!(
                path = %from,
                redirect_to = %target,
                hops = hops,
                "Middleware redirect chain exceeded the hop budget, rendering error boundary"
            );
            let resolver = BoundaryResolver::new(Arc::clone(table));
            self.publish_boundary(
                &resolver,
                route,
                BoundaryKind::Error,
                Some(format!("redirect chain exceeded {MAX_REDIRECT_HOPS} hops")),
            );
            return;
        }
        self.controller.navigate(
            target,
            NavigateOptions {
                replace,
                ..NavigateOptions::default()
            },
        );
    }

    fn publish_boundary(
        self: &Arc<Self>,
        resolver: &BoundaryResolver,
        route: &Arc<ResolvedRoute>,
        kind: BoundaryKind,
        failure: Option<String>,
    ) {
        // The boundary's reset affordance is the recovery path out of a
        // terminal middleware outcome, so it is always attached.
        let mut ctx = RenderContext::empty().with_reset(self.reset_handle());
        if let Some(failure) = failure {
            ctx = ctx.with_failure(failure);
        }
        let content = match resolver.resolve(route, kind) {
            Some(renderable) => renderable.resolve(&ctx).unwrap_or_else(|e| {
                warn!(error = %e, kind = ?kind, "Boundary content failed, using default");
                default_boundary_content(kind)
            }),
            None => default_boundary_content(kind),
        };
        self.output.set(content);
    }

    fn reset_handle(self: &Arc<Self>) -> ResetHandle {
        let weak: Weak<OutletInner> = Arc::downgrade(self);
        ResetHandle::new(Arc::new(move || {
            if let Some(inner) = weak.upgrade() {
                debug!("Error boundary reset, re-running render cycle");
                inner.render_cycle();
            }
        }))
    }

    /// Compiled matcher for `table`, memoized by table identity. An
    /// outlet with its own table keeps its own cache so it never thrashes
    /// against the controller's ambient one.
    fn matcher_for(&self, table: &Arc<RouteTable>) -> Option<Arc<Matcher>> {
        let mut cache = match self.matcher_cache.lock() {
            Ok(cache) => cache,
            Err(_) => return None,
        };
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
    }
}

/// Build the composition closure for a matched route: resolve the leaf
/// component, then wrap it in every layout from the route outward to the
/// root. Each layout receives the inner content staged on the context. Any
/// failure (or panic) resolves through the error boundary instead.
fn composer(
    route: &Arc<ResolvedRoute>,
    ctx: RenderContext,
    error_boundary: Option<Renderable>,
    reset: ResetHandle,
) -> Box<dyn FnOnce() -> Content + Send> {
    let component = route
        .definition
        .get_component()
        .cloned()
        .unwrap_or(Renderable::Inline(Content::Empty));

    // Innermost first: the route's own layout, then ancestors from
    // nearest to root.
    let mut layouts: Vec<Renderable> = Vec::new();
    if let Some(own) = route.definition.get_layout() {
        layouts.push(own.clone());
    }
    for ancestor in route.ancestors.iter().rev() {
        if let Some(layout) = ancestor.definition.get_layout() {
            layouts.push(layout.clone());
        }
    }

    let path = route.path.clone();
    Box::new(move || {
        let result = catch_unwind(AssertUnwindSafe(|| -> anyhow::Result<Content> {
            let mut content = component.resolve(&ctx)?;
            for layout in &layouts {
                ctx.stage_nested(content);
                content = layout.resolve(&ctx)?;
            }
            Ok(content)
        }));
        let failure = match result {
            Ok(Ok(content)) => return content,
            Ok(Err(e)) => e.to_string(),
            Err(panic) => format!("render panicked: {}", panic_text(&panic)),
        };
        warn!(path = %path, failure = %failure, "Render failed, routing to error boundary");
        let boundary_ctx = RenderContext::empty()
            .with_failure(failure)
            .with_reset(reset);
        match &error_boundary {
            Some(renderable) => renderable.resolve(&boundary_ctx).unwrap_or_else(|e| {
                warn!(error = %e, "Error boundary itself failed, using default");
                default_boundary_content(BoundaryKind::Error)
            }),
            None => default_boundary_content(BoundaryKind::Error),
        }
    })
}

/// Merge decoder tables root-to-leaf; leaf declarations shadow ancestors.
fn collect_decoders(route: &ResolvedRoute) -> (DecoderMap, DecoderMap) {
    let mut params = DecoderMap::new();
    let mut query = DecoderMap::new();
    for ancestor in &route.ancestors {
        params.extend(ancestor.definition.param_decoders().clone());
        query.extend(ancestor.definition.query_decoders().clone());
    }
    params.extend(route.definition.param_decoders().clone());
    query.extend(route.definition.query_decoders().clone());
    (params, query)
}

/// Run service modules root-to-leaf into one registry. Later providers
/// shadow earlier entries under the same key.
fn collect_services(route: &ResolvedRoute) -> ServiceRegistry {
    let mut registry = ServiceRegistry::new();
    for ancestor in &route.ancestors {
        for module in ancestor.definition.service_modules() {
            debug!(module = %module.name(), "Providing ancestor services");
            module.provide(&mut registry);
        }
    }
    for module in route.definition.service_modules() {
        debug!(module = %module.name(), "Providing route services");
        module.provide(&mut registry);
    }
    registry
}

fn panic_text(panic: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{Content, Renderable};
    use crate::platform::Platform;
    use crate::route::RouteDefinition;

    fn leaf(text: &str) -> Renderable {
        Renderable::inline(Content::text(text))
    }

    fn table(defs: Vec<RouteDefinition>) -> Arc<RouteTable> {
        RouteTable::new(defs).unwrap()
    }

    #[test]
    fn test_mounted_outlet_renders_current_route() {
        let table = table(vec![RouteDefinition::index().component(leaf("home"))]);
        let controller = NavigationController::with_table(table, Platform::in_memory());
        let outlet = Outlet::new(controller);
        outlet.mount();
        assert_eq!(outlet.output().get().flat_text(), "home");
    }

    #[test]
    fn test_navigation_republishes() {
        let table = table(vec![
            RouteDefinition::index().component(leaf("home")),
            RouteDefinition::path("about").component(leaf("about")),
        ]);
        let controller = NavigationController::with_table(table, Platform::in_memory());
        let outlet = Outlet::new(Arc::clone(&controller));
        outlet.mount();
        controller.navigate("/about", NavigateOptions::default());
        assert_eq!(outlet.output().get().flat_text(), "about");
    }

    #[test]
    fn test_layouts_wrap_inner_to_outer() {
        let table = table(vec![RouteDefinition::path("docs")
            .layout(Renderable::render(|ctx| {
                Ok(Content::element(
                    "section",
                    vec![ctx.take_nested().unwrap_or_default()],
                ))
            }))
            .child(RouteDefinition::index().component(leaf("guide")))]);
        let controller = NavigationController::with_table(table, Platform::in_memory());
        let outlet = Outlet::new(Arc::clone(&controller));
        outlet.mount();
        controller.navigate("/docs", NavigateOptions::default());
        match &*outlet.output().get() {
            Content::Element { tag, children } => {
                assert_eq!(tag, "section");
                assert_eq!(children[0].flat_text(), "guide");
            }
            other => panic!("expected wrapped element, got {other:?}"),
        }
    }

    #[test]
    fn test_unmatched_path_renders_not_found() {
        let table = table(vec![RouteDefinition::path("only").component(leaf("only"))]);
        let controller = NavigationController::with_table(table, Platform::in_memory());
        let outlet = Outlet::new(Arc::clone(&controller));
        outlet.mount();
        controller.navigate("/missing", NavigateOptions::default());
        assert_eq!(outlet.output().get().flat_text(), "404 Not Found");
    }

    #[test]
    fn test_loader_engages_only_when_a_loading_boundary_is_in_scope() {
        let table = table(vec![
            RouteDefinition::index().component(leaf("home")),
            RouteDefinition::path("deferred")
                .loading(leaf("loading"))
                .component(leaf("deferred page")),
        ]);
        let controller = NavigationController::with_table(table, Platform::in_memory());
        let outlet = Outlet::new(Arc::clone(&controller));
        outlet.mount();
        assert!(outlet.inner.loader.get().is_none());

        controller.navigate("/deferred", NavigateOptions::default());
        assert!(outlet.inner.loader.get().is_some());
    }

    #[test]
    fn test_staged_content_bypasses_matching() {
        let table = table(vec![RouteDefinition::index().component(leaf("home"))]);
        let controller = NavigationController::with_table(table, Platform::in_memory());
        let outlet = Outlet::new(controller);
        outlet.stage_nested(Content::text("handed down"));
        outlet.mount();
        assert_eq!(outlet.output().get().flat_text(), "handed down");
    }
}
