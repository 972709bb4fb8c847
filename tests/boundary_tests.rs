mod common;

use common::fixtures::{leaf, table};
use common::tracing_init::setup_tracing;
use std::sync::Arc;
use wayfarer::boundary::{default_boundary_content, BoundaryKind, BoundaryResolver};
use wayfarer::content::RenderContext;
use wayfarer::route::RouteDefinition;

#[test]
fn test_own_boundary_beats_ancestors() {
    setup_tracing();
    let table = table(vec![RouteDefinition::path("app")
        .error(leaf("app error"))
        .child(
            RouteDefinition::index()
                .component(leaf("page"))
                .error(leaf("page error")),
        )]);
    let resolver = BoundaryResolver::new(Arc::clone(&table));
    let route = &table.routes()[0];

    let boundary = resolver.resolve(route, BoundaryKind::Error).unwrap();
    let content = boundary.resolve(&RenderContext::empty()).unwrap();
    assert_eq!(content.flat_text(), "page error");
}

#[test]
fn test_nearest_ancestor_wins_over_root() {
    setup_tracing();
    let table = table(vec![RouteDefinition::path("app")
        .error(leaf("root error"))
        .child(
            RouteDefinition::path("settings")
                .error(leaf("settings error"))
                .child(RouteDefinition::index().component(leaf("settings page"))),
        )]);
    let resolver = BoundaryResolver::new(Arc::clone(&table));
    let route = &table.routes()[0];

    let boundary = resolver.resolve(route, BoundaryKind::Error).unwrap();
    let content = boundary.resolve(&RenderContext::empty()).unwrap();
    assert_eq!(content.flat_text(), "settings error");
}

#[test]
fn test_each_kind_resolves_independently() {
    setup_tracing();
    let table = table(vec![RouteDefinition::path("app")
        .error(leaf("err"))
        .loading(leaf("load"))
        .child(
            RouteDefinition::index()
                .component(leaf("page"))
                .forbidden(leaf("deny")),
        )]);
    let resolver = BoundaryResolver::new(Arc::clone(&table));
    let route = &table.routes()[0];

    let err = resolver.resolve(route, BoundaryKind::Error).unwrap();
    let load = resolver.resolve(route, BoundaryKind::Loading).unwrap();
    let deny = resolver.resolve(route, BoundaryKind::Forbidden).unwrap();
    let ctx = RenderContext::empty();
    assert_eq!(err.resolve(&ctx).unwrap().flat_text(), "err");
    assert_eq!(load.resolve(&ctx).unwrap().flat_text(), "load");
    assert_eq!(deny.resolve(&ctx).unwrap().flat_text(), "deny");
}

#[test]
fn test_missing_boundary_resolves_to_none() {
    setup_tracing();
    let table = table(vec![RouteDefinition::path("bare").component(leaf("bare"))]);
    let resolver = BoundaryResolver::new(Arc::clone(&table));
    let route = &table.routes()[0];

    assert!(resolver.resolve(route, BoundaryKind::Error).is_none());
    assert!(resolver.resolve(route, BoundaryKind::Loading).is_none());
    assert!(resolver.resolve(route, BoundaryKind::Forbidden).is_none());
}

#[test]
fn test_defaults_cover_every_kind() {
    setup_tracing();
    assert_eq!(
        default_boundary_content(BoundaryKind::Error).flat_text(),
        "Something went wrong"
    );
    assert_eq!(
        default_boundary_content(BoundaryKind::Forbidden).flat_text(),
        "403 Forbidden"
    );
    assert_eq!(
        default_boundary_content(BoundaryKind::Loading).flat_text(),
        "Loading..."
    );
}

#[test]
fn test_not_found_lives_at_the_table_root() {
    setup_tracing();
    let with = table(vec![RouteDefinition::path("home")
        .component(leaf("home"))
        .not_found(leaf("custom 404"))]);
    let resolver = BoundaryResolver::new(with);
    let content = resolver
        .not_found()
        .unwrap()
        .resolve(&RenderContext::empty())
        .unwrap();
    assert_eq!(content.flat_text(), "custom 404");

    let without = table(vec![RouteDefinition::path("home").component(leaf("home"))]);
    assert!(BoundaryResolver::new(without).not_found().is_none());
}
