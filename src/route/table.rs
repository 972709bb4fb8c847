//! Route tables: resolved route lists with a stable identity.
//!
//! The outlet memoizes its compiled matcher by table identity, so a table
//! must be able to say "am I the same table the matcher was built from"
//! without deep comparison. Every `RouteTable` gets a process-unique id at
//! construction; replacing the table (and only that) changes the id.

use super::definition::RouteDefinition;
use super::resolver::{resolve_routes, ResolvedRoute};
use crate::content::Renderable;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::info;

static NEXT_TABLE_ID: AtomicU64 = AtomicU64::new(1);

/// An authored route tree, resolved and ready for matching.
#[derive(Debug)]
pub struct RouteTable {
    id: u64,
    resolved: Vec<Arc<ResolvedRoute>>,
    not_found: Option<Renderable>,
}

impl RouteTable {
    /// Resolve an authored tree into a table.
    ///
    /// Fails if any node declares both a component and children.
    pub fn new(roots: Vec<RouteDefinition>) -> anyhow::Result<Arc<Self>> {
        let resolved = resolve_routes(&roots)?;
        // The not-found boundary lives at the table root: a non-match has
        // no matched route to walk ancestors from.
        let not_found = roots
            .iter()
            .find_map(|root| root.get_not_found().cloned());

        let routes_summary: Vec<String> = resolved
            .iter()
            .take(10)
            .map(|r| r.path.clone())
            .collect();
        let table = Arc::new(Self {
            id: NEXT_TABLE_ID.fetch_add(1, Ordering::Relaxed),
            resolved,
            not_found,
        });
        info!(
            table_id = table.id,
            routes_count = table.resolved.len(),
            routes_summary = ?routes_summary,
            "Route table resolved"
        );
        Ok(table)
    }

    /// Process-unique identity, used to memoize the compiled matcher.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Resolved match targets in authoring (pre-order) order.
    #[must_use]
    pub fn routes(&self) -> &[Arc<ResolvedRoute>] {
        &self.resolved
    }

    /// Root-level not-found boundary, if declared.
    #[must_use]
    pub fn not_found(&self) -> Option<&Renderable> {
        self.not_found.as_ref()
    }

    /// Whether the table has no match targets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty()
    }
}
