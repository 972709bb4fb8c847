mod common;

use common::fixtures::{controller, leaf};
use common::runtime::setup_may_runtime;
use common::tracing_init::setup_tracing;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wayfarer::context::NavScope;
use wayfarer::middleware::{
    fire_prefetch, run_pipeline, FnMiddleware, FnPrefetch, MiddlewareError, MiddlewareResult,
    NavRequest,
};
use wayfarer::route::{resolve_routes, ResolvedRoute, RouteDefinition};

fn request_for(route: &Arc<ResolvedRoute>) -> NavRequest {
    NavRequest {
        path: route.path.clone(),
        params: HashMap::new(),
        query: HashMap::new(),
        route: Arc::clone(route),
    }
}

fn recorder(
    log: &Arc<Mutex<Vec<&'static str>>>,
    tag: &'static str,
) -> Arc<dyn wayfarer::middleware::Middleware> {
    let log = Arc::clone(log);
    Arc::new(FnMiddleware::new(move |_req: &NavRequest| {
        log.lock().unwrap().push(tag);
        Ok(())
    }))
}

#[test]
fn test_chain_runs_ancestors_before_own_tasks() {
    setup_tracing();
    let log = Arc::new(Mutex::new(Vec::new()));
    let defs = vec![RouteDefinition::path("admin")
        .middleware(recorder(&log, "root"))
        .child(
            RouteDefinition::path("reports")
                .middleware(recorder(&log, "section"))
                .child(
                    RouteDefinition::index()
                        .component(leaf("reports"))
                        .middleware(recorder(&log, "leaf")),
                ),
        )];
    let routes = resolve_routes(&defs).unwrap();
    let req = request_for(&routes[0]);

    assert!(run_pipeline(&routes[0], &req).is_continue());
    assert_eq!(*log.lock().unwrap(), vec!["root", "section", "leaf"]);
}

#[test]
fn test_first_halt_stops_later_tasks() {
    setup_tracing();
    let later_ran = Arc::new(AtomicUsize::new(0));
    let later_clone = Arc::clone(&later_ran);
    let defs = vec![RouteDefinition::path("gated")
        .component(leaf("gated"))
        .middleware(Arc::new(FnMiddleware::new(|_req: &NavRequest| {
            Err(MiddlewareError::Forbidden)
        })))
        .middleware(Arc::new(FnMiddleware::new(move |_req: &NavRequest| {
            later_clone.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })))];
    let routes = resolve_routes(&defs).unwrap();
    let req = request_for(&routes[0]);

    assert!(matches!(
        run_pipeline(&routes[0], &req),
        MiddlewareResult::Forbidden
    ));
    assert_eq!(later_ran.load(Ordering::SeqCst), 0);
}

#[test]
fn test_redirect_carries_target_and_replace_flag() {
    setup_tracing();
    let defs = vec![RouteDefinition::path("old")
        .component(leaf("old"))
        .middleware(Arc::new(FnMiddleware::new(|_req: &NavRequest| {
            Err(MiddlewareError::Redirect {
                path: "/new".to_string(),
                replace: true,
            })
        })))];
    let routes = resolve_routes(&defs).unwrap();
    let req = request_for(&routes[0]);

    match run_pipeline(&routes[0], &req) {
        MiddlewareResult::Redirect { path, replace } => {
            assert_eq!(path, "/new");
            assert!(replace);
        }
        other => panic!("expected redirect, got {other:?}"),
    }
}

#[test]
fn test_domain_error_is_terminal_with_cause() {
    setup_tracing();
    let defs = vec![RouteDefinition::path("broken")
        .component(leaf("broken"))
        .middleware(Arc::new(FnMiddleware::new(|_req: &NavRequest| {
            Err(anyhow::anyhow!("session store unreachable").into())
        })))];
    let routes = resolve_routes(&defs).unwrap();
    let req = request_for(&routes[0]);

    match run_pipeline(&routes[0], &req) {
        MiddlewareResult::Error { cause } => {
            assert!(cause.to_string().contains("session store unreachable"));
        }
        other => panic!("expected error, got {other:?}"),
    }
}

#[test]
fn test_task_sees_request_params() {
    setup_tracing();
    let seen = Arc::new(Mutex::new(None));
    let seen_clone = Arc::clone(&seen);
    let defs = vec![RouteDefinition::path("users/:id")
        .component(leaf("user"))
        .middleware(Arc::new(FnMiddleware::new(move |req: &NavRequest| {
            *seen_clone.lock().unwrap() = req.params.get("id").cloned();
            Ok(())
        })))];
    let routes = resolve_routes(&defs).unwrap();
    let mut req = request_for(&routes[0]);
    req.params.insert("id".to_string(), "42".to_string());

    assert!(run_pipeline(&routes[0], &req).is_continue());
    assert_eq!(seen.lock().unwrap().as_deref(), Some("42"));
}

#[test]
fn test_prefetch_tasks_all_fire_and_failures_are_ignored() {
    setup_tracing();
    setup_may_runtime();
    let fired = Arc::new(AtomicUsize::new(0));
    let a = Arc::clone(&fired);
    let b = Arc::clone(&fired);
    let defs = vec![RouteDefinition::path("warm")
        .component(leaf("warm"))
        .prefetch(Arc::new(FnPrefetch::new(move |_req: &NavRequest| {
            a.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })))
        .prefetch(Arc::new(FnPrefetch::new(move |_req: &NavRequest| {
            b.fetch_add(1, Ordering::SeqCst);
            anyhow::bail!("cache warmer offline")
        })))];
    let routes = resolve_routes(&defs).unwrap();
    let req = request_for(&routes[0]);
    let ctrl = controller(vec![RouteDefinition::index().component(leaf("home"))]);

    fire_prefetch(&routes[0], &req, NavScope::new(ctrl));
    assert!(common::fixtures::wait_for(Duration::from_secs(2), || {
        fired.load(Ordering::SeqCst) == 2
    }));
}

#[test]
fn test_prefetch_coroutines_carry_the_navigation_scope() {
    setup_tracing();
    setup_may_runtime();
    let scoped = Arc::new(AtomicUsize::new(0));
    let scoped_clone = Arc::clone(&scoped);
    let defs = vec![RouteDefinition::path("warm")
        .component(leaf("warm"))
        .prefetch(Arc::new(FnPrefetch::new(move |_req: &NavRequest| {
            if wayfarer::context::current().is_some() {
                scoped_clone.fetch_add(1, Ordering::SeqCst);
            }
            Ok(())
        })))];
    let routes = resolve_routes(&defs).unwrap();
    let req = request_for(&routes[0]);
    let ctrl = controller(vec![RouteDefinition::index().component(leaf("home"))]);

    fire_prefetch(&routes[0], &req, NavScope::new(ctrl));
    assert!(common::fixtures::wait_for(Duration::from_secs(2), || {
        scoped.load(Ordering::SeqCst) == 1
    }));
}
