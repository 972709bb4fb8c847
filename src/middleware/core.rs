//! Middleware and prefetch contracts.
//!
//! Middleware is the per-route access-control seam: each task either
//! allows the navigation to continue or halts it with a control-flow
//! signal (redirect, forbidden) or a domain error. Prefetch tasks are the
//! fire-and-forget counterpart, warmed concurrently and never awaited for
//! correctness.

use crate::matcher::RouteMatch;
use crate::route::ResolvedRoute;
use std::collections::HashMap;
use std::sync::Arc;

/// Snapshot of the navigation a middleware or prefetch task inspects.
#[derive(Debug, Clone)]
pub struct NavRequest {
    /// The active location path (query stripped).
    pub path: String,
    /// Raw path params extracted by the matcher.
    pub params: HashMap<String, String>,
    /// Raw query fields.
    pub query: HashMap<String, String>,
    /// The matched route.
    pub route: Arc<ResolvedRoute>,
}

impl NavRequest {
    /// Build a request from a route match plus the active query.
    #[must_use]
    pub fn from_match(path: &str, m: &RouteMatch, query: HashMap<String, String>) -> Self {
        Self {
            path: path.to_string(),
            params: m.params_map(),
            query,
            route: Arc::clone(&m.route),
        }
    }
}

/// Non-success outcome of a single middleware task.
#[derive(Debug)]
pub enum MiddlewareError {
    /// Intentional control flow: send the client elsewhere.
    Redirect {
        /// Target location.
        path: String,
        /// Replace the current history entry instead of pushing.
        replace: bool,
    },
    /// Intentional control flow: access denied.
    Forbidden,
    /// A domain error; surfaces through the nearest error boundary.
    Failure(anyhow::Error),
}

impl From<anyhow::Error> for MiddlewareError {
    fn from(cause: anyhow::Error) -> Self {
        MiddlewareError::Failure(cause)
    }
}

/// Classified result of running a route's full middleware chain.
#[derive(Debug)]
pub enum MiddlewareResult {
    /// Every task succeeded; the render proceeds.
    Continue,
    /// A task requested a client-side redirect.
    Redirect {
        /// Target location.
        path: String,
        /// Replace the current history entry instead of pushing.
        replace: bool,
    },
    /// A task denied access.
    Forbidden,
    /// A task failed (domain error or captured panic).
    Error {
        /// The underlying failure.
        cause: anyhow::Error,
    },
}

impl MiddlewareResult {
    /// Whether the pipeline allowed the navigation.
    #[must_use]
    pub fn is_continue(&self) -> bool {
        matches!(self, MiddlewareResult::Continue)
    }
}

/// One access-control task in a route's middleware chain.
///
/// Returning `Ok(())` means "allow, continue". The first non-success halts
/// the chain and becomes the pipeline's result.
pub trait Middleware: Send + Sync {
    fn handle(&self, req: &NavRequest) -> Result<(), MiddlewareError>;
}

/// Adapter turning a closure into a [`Middleware`].
pub struct FnMiddleware<F>(F);

impl<F> FnMiddleware<F>
where
    F: Fn(&NavRequest) -> Result<(), MiddlewareError> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> Middleware for FnMiddleware<F>
where
    F: Fn(&NavRequest) -> Result<(), MiddlewareError> + Send + Sync,
{
    fn handle(&self, req: &NavRequest) -> Result<(), MiddlewareError> {
        (self.0)(req)
    }
}

/// A best-effort warm-up task fired when its route activates.
///
/// Tasks run concurrently with the render, unordered; errors are logged
/// and ignored.
pub trait PrefetchTask: Send + Sync {
    fn run(&self, req: &NavRequest) -> anyhow::Result<()>;
}

/// Adapter turning a closure into a [`PrefetchTask`].
pub struct FnPrefetch<F>(F);

impl<F> FnPrefetch<F>
where
    F: Fn(&NavRequest) -> anyhow::Result<()> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> PrefetchTask for FnPrefetch<F>
where
    F: Fn(&NavRequest) -> anyhow::Result<()> + Send + Sync,
{
    fn run(&self, req: &NavRequest) -> anyhow::Result<()> {
        (self.0)(req)
    }
}
