mod common;

use common::fixtures::{leaf, table, wait_for};
use common::runtime::setup_may_runtime;
use common::tracing_init::setup_tracing;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use wayfarer::middleware::{FnPrefetch, NavRequest};
use wayfarer::nav::{NavigateOptions, NavigationController, ScrollStrategy};
use wayfarer::outlet::Outlet;
use wayfarer::platform::{
    DomProvider, HistoryProvider, MemoryDom, MemoryHistory, MemoryScroll, MemoryStorage, Platform,
    ScrollOffset, ScrollProvider,
};
use wayfarer::route::{RouteDefinition, RouteTable};

struct Harness {
    controller: Arc<NavigationController>,
    history: Arc<MemoryHistory>,
    scroll: Arc<MemoryScroll>,
    dom: Arc<MemoryDom>,
    outlet: Outlet,
}

fn harness(table: Arc<RouteTable>) -> Harness {
    let history = Arc::new(MemoryHistory::new());
    let scroll = Arc::new(MemoryScroll::new());
    let dom = Arc::new(MemoryDom::new());
    let platform = Platform::new(
        Arc::clone(&history) as Arc<dyn HistoryProvider>,
        Arc::new(MemoryStorage::new()),
        Arc::clone(&scroll) as Arc<dyn ScrollProvider>,
        Arc::clone(&dom) as Arc<dyn DomProvider>,
    );
    let controller = NavigationController::with_table(table, platform);
    let outlet = Outlet::new(Arc::clone(&controller));
    outlet.mount();
    Harness {
        controller,
        history,
        scroll,
        dom,
        outlet,
    }
}

fn pages() -> Arc<RouteTable> {
    table(vec![
        RouteDefinition::index().component(leaf("home")),
        RouteDefinition::path("one").component(leaf("one")),
        RouteDefinition::path("two").component(leaf("two")),
        RouteDefinition::path("users/:id").component(leaf("user")),
    ])
}

#[test]
fn test_navigate_pushes_history_and_updates_state() {
    setup_tracing();
    let h = harness(pages());
    assert_eq!(h.controller.current_path(), "/");

    h.controller.navigate("/one", NavigateOptions::default());
    assert_eq!(h.controller.current_path(), "/one");
    assert_eq!(h.outlet.output().get().flat_text(), "one");
    // Initial entry plus the push.
    assert_eq!(h.history.len(), 2);
}

#[test]
fn test_replace_does_not_grow_history() {
    setup_tracing();
    let h = harness(pages());
    h.controller.navigate(
        "/one",
        NavigateOptions {
            replace: true,
            ..NavigateOptions::default()
        },
    );
    assert_eq!(h.history.len(), 1);
    assert_eq!(h.controller.current_path(), "/one");
}

#[test]
fn test_back_and_forward_traverse_entries() {
    setup_tracing();
    let h = harness(pages());
    h.controller.navigate("/one", NavigateOptions::default());
    h.controller.navigate("/two", NavigateOptions::default());

    h.controller.back();
    assert_eq!(h.controller.current_path(), "/one");
    assert_eq!(h.outlet.output().get().flat_text(), "one");

    h.controller.back();
    assert_eq!(h.controller.current_path(), "/");

    h.controller.forward();
    assert_eq!(h.controller.current_path(), "/one");
}

#[test]
fn test_back_at_the_edge_is_a_no_op() {
    setup_tracing();
    let h = harness(pages());
    h.controller.back();
    assert_eq!(h.controller.current_path(), "/");
    h.controller.forward();
    assert_eq!(h.controller.current_path(), "/");
}

#[test]
fn test_param_interpolation_builds_the_path() {
    setup_tracing();
    let h = harness(pages());
    h.controller.navigate(
        "/users/:id",
        NavigateOptions {
            params: HashMap::from([("id".to_string(), "42".to_string())]),
            ..NavigateOptions::default()
        },
    );
    assert_eq!(h.controller.current_path(), "/users/42");
}

#[test]
fn test_options_query_merges_with_path_query() {
    setup_tracing();
    let h = harness(table(vec![
        RouteDefinition::index().component(leaf("home")),
        RouteDefinition::path("search").component(leaf("search")),
    ]));
    h.controller.navigate(
        "/search?q=rust",
        NavigateOptions {
            query: vec![("page".to_string(), "2".to_string())],
            ..NavigateOptions::default()
        },
    );
    let query = h.controller.current_query();
    assert_eq!(query.get("q").map(String::as_str), Some("rust"));
    assert_eq!(query.get("page").map(String::as_str), Some("2"));
    assert_eq!(h.controller.current_path(), "/search");
}

#[test]
fn test_is_active_exact_and_prefix() {
    setup_tracing();
    let h = harness(pages());
    let exact = h.controller.is_active("/one", true);
    let prefix = h.controller.is_active("/users", false);

    assert!(!*exact.get());
    h.controller.navigate("/one", NavigateOptions::default());
    assert!(*exact.get());

    h.controller.navigate(
        "/users/:id",
        NavigateOptions {
            params: HashMap::from([("id".to_string(), "7".to_string())]),
            ..NavigateOptions::default()
        },
    );
    assert!(!*exact.get());
    assert!(*prefix.get());
}

#[test]
fn test_root_is_active_for_everything_unless_exact() {
    setup_tracing();
    let h = harness(pages());
    let loose = h.controller.is_active("/", false);
    let strict = h.controller.is_active("/", true);

    assert!(*loose.get());
    assert!(*strict.get());
    h.controller.navigate("/one", NavigateOptions::default());
    assert!(*loose.get());
    assert!(!*strict.get());
}

#[test]
fn test_popstate_restores_persisted_scroll_offset() {
    setup_tracing();
    let h = harness(pages());

    // Simulate the user scrolling down on the first page.
    h.scroll.set_offset(ScrollOffset::new(0.0, 480.0));
    h.controller.navigate("/one", NavigateOptions::default());
    // Forward navigation goes to the top.
    assert_eq!(h.scroll.current_offset(), ScrollOffset::default());

    h.controller.back();
    assert_eq!(h.scroll.current_offset(), ScrollOffset::new(0.0, 480.0));
}

#[test]
fn test_fragment_scrolls_into_view_when_present() {
    setup_tracing();
    let h = harness(pages());
    h.dom.register("pricing");
    h.controller.navigate("/one#pricing", NavigateOptions::default());
    assert_eq!(h.scroll.last_into_view().as_deref(), Some("pricing"));

    // Missing target degrades to top.
    h.controller.navigate("/two#nowhere", NavigateOptions::default());
    assert_eq!(h.scroll.current_offset(), ScrollOffset::default());
}

#[test]
fn test_preserve_strategy_leaves_the_viewport_alone() {
    setup_tracing();
    let h = harness(table(vec![
        RouteDefinition::index().component(leaf("home")),
        RouteDefinition::path("gallery")
            .scroll_strategy(ScrollStrategy::Preserve)
            .component(leaf("gallery")),
    ]));
    h.scroll.set_offset(ScrollOffset::new(0.0, 250.0));
    h.controller.navigate("/gallery", NavigateOptions::default());
    assert_eq!(h.scroll.current_offset(), ScrollOffset::new(0.0, 250.0));
}

#[test]
fn test_prefetch_warms_without_navigating() {
    setup_tracing();
    setup_may_runtime();
    let fired = Arc::new(AtomicUsize::new(0));
    let fired_clone = Arc::clone(&fired);
    let h = harness(table(vec![
        RouteDefinition::index().component(leaf("home")),
        RouteDefinition::path("heavy")
            .component(leaf("heavy"))
            .prefetch(Arc::new(FnPrefetch::new(move |_req: &NavRequest| {
                fired_clone.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }))),
    ]));

    h.controller.prefetch("/heavy");
    assert!(wait_for(Duration::from_secs(2), || {
        fired.load(Ordering::SeqCst) == 1
    }));
    assert_eq!(h.controller.current_path(), "/");
    assert_eq!(h.outlet.output().get().flat_text(), "home");
}

#[test]
fn test_push_after_back_truncates_forward_entries() {
    setup_tracing();
    let h = harness(pages());
    h.controller.navigate("/one", NavigateOptions::default());
    h.controller.navigate("/two", NavigateOptions::default());
    h.controller.back();
    h.controller.navigate("/users/7", NavigateOptions::default());

    h.controller.forward();
    // No forward entry survived the push.
    assert_eq!(h.controller.current_path(), "/users/7");
}
