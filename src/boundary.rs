//! # Boundary Resolution Module
//!
//! Nearest-wins lookup of fallback content for error, forbidden, and
//! loading states, plus the table-root not-found boundary.
//!
//! Resolution is a stateless function of the route table: a route's own
//! boundary wins; otherwise the ancestor chain is walked from the nearest
//! enclosing parent outward; if nothing in the chain defines one, the
//! caller substitutes a minimal plain-text default. Not-found has no
//! per-route nesting - a non-match has no matched route to walk ancestors
//! from - so it resolves only at the table root.

use crate::content::{Content, Renderable};
use crate::route::{ResolvedRoute, RouteTable};
use std::sync::Arc;

/// The boundary states a route subtree can fall back into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryKind {
    /// Render or middleware domain failure.
    Error,
    /// Middleware denied access.
    Forbidden,
    /// Async render in flight.
    Loading,
}

/// Boundary lookup over one route table.
pub struct BoundaryResolver {
    table: Arc<RouteTable>,
}

impl BoundaryResolver {
    #[must_use]
    pub fn new(table: Arc<RouteTable>) -> Self {
        Self { table }
    }

    /// Nearest boundary of `kind` for the matched route: the route's own
    /// definition first, then ancestors nearest-first. `None` when the
    /// whole chain defines nothing.
    #[must_use]
    pub fn resolve(&self, route: &ResolvedRoute, kind: BoundaryKind) -> Option<Renderable> {
        if let Some(own) = boundary_field(&route.definition, kind) {
            return Some(own.clone());
        }
        route
            .ancestors
            .iter()
            .rev()
            .find_map(|ancestor| boundary_field(&ancestor.definition, kind).cloned())
    }

    /// The table-root not-found boundary, if declared.
    #[must_use]
    pub fn not_found(&self) -> Option<Renderable> {
        self.table.not_found().cloned()
    }
}

fn boundary_field(
    definition: &crate::route::RouteDefinition,
    kind: BoundaryKind,
) -> Option<&Renderable> {
    match kind {
        BoundaryKind::Error => definition.get_error(),
        BoundaryKind::Forbidden => definition.get_forbidden(),
        BoundaryKind::Loading => definition.get_loading(),
    }
}

/// Minimal default content used when no boundary exists in the chain.
#[must_use]
pub fn default_boundary_content(kind: BoundaryKind) -> Content {
    match kind {
        BoundaryKind::Error => Content::text("Something went wrong"),
        BoundaryKind::Forbidden => Content::text("403 Forbidden"),
        BoundaryKind::Loading => Content::text("Loading..."),
    }
}

/// Minimal default for unmatched paths.
#[must_use]
pub fn default_not_found_content() -> Content {
    Content::text("404 Not Found")
}
