//! Sequential middleware execution and prefetch fan-out.

use super::core::{Middleware, MiddlewareError, MiddlewareResult, NavRequest};
use crate::context::NavScope;
use crate::route::ResolvedRoute;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Run the matched route's middleware chain.
///
/// The chain is the concatenation of every ancestor's tasks, root to
/// leaf, followed by the route's own. Execution is strictly sequential;
/// the first non-success halts the chain and becomes the result. A
/// panicking task is captured and reclassified as an `Error` result
/// rather than escaping as an unhandled fault.
#[must_use]
pub fn run_pipeline(route: &ResolvedRoute, req: &NavRequest) -> MiddlewareResult {
    let chain: Vec<&Arc<dyn Middleware>> = route
        .ancestors
        .iter()
        .flat_map(|a| a.definition.middleware_tasks())
        .chain(route.definition.middleware_tasks())
        .collect();

    debug!(
        path = %req.path,
        middleware_count = chain.len(),
        "Middleware pipeline start"
    );

    for (idx, task) in chain.iter().enumerate() {
        let outcome = catch_unwind(AssertUnwindSafe(|| task.handle(req)));
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(MiddlewareError::Redirect { path, replace })) => {
                info!(
                    path = %req.path,
                    middleware_idx = idx,
                    redirect_to = %path,
                    replace = replace,
                    "Middleware redirected"
                );
                return MiddlewareResult::Redirect { path, replace };
            }
            Ok(Err(MiddlewareError::Forbidden)) => {
                info!(
                    path = %req.path,
                    middleware_idx = idx,
                    "Middleware denied access"
                );
                return MiddlewareResult::Forbidden;
            }
            Ok(Err(MiddlewareError::Failure(cause))) => {
                warn!(
                    path = %req.path,
                    middleware_idx = idx,
                    error = %cause,
                    "Middleware failed"
                );
                return MiddlewareResult::Error { cause };
            }
            Err(panic) => {
                error!(
                    path = %req.path,
                    middleware_idx = idx,
                    panic_message = ?panic_text(&panic),
                    "Middleware panicked"
                );
                return MiddlewareResult::Error {
                    cause: anyhow::anyhow!("middleware panicked: {}", panic_text(&panic)),
                };
            }
        }
    }

    MiddlewareResult::Continue
}

/// Fire the route's prefetch tasks.
///
/// Each task runs on its own forked coroutine with unordered, unbounded
/// concurrency; nothing downstream waits on them and their errors are
/// logged at debug level and otherwise ignored. Every coroutine re-enters
/// `scope` so tasks can reach the active controller.
pub fn fire_prefetch(route: &ResolvedRoute, req: &NavRequest, scope: NavScope) {
    let tasks = route.definition.prefetch_tasks();
    if tasks.is_empty() {
        return;
    }
    debug!(
        path = %req.path,
        prefetch_count = tasks.len(),
        "Prefetch fan-out"
    );
    for task in tasks {
        let task = Arc::clone(task);
        let req = req.clone();
        let scope = scope.clone();
        may::go!(move || {
            let _guard = scope.enter();
            let outcome = catch_unwind(AssertUnwindSafe(|| task.run(&req)));
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    debug!(path = %req.path, error = %e, "Prefetch task failed (ignored)");
                }
                Err(panic) => {
                    debug!(
                        path = %req.path,
                        panic_message = ?panic_text(&panic),
                        "Prefetch task panicked (ignored)"
                    );
                }
            }
        });
    }
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
