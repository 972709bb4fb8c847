//! Route table resolution: flattening the authored tree into absolute-path
//! route records with ancestor chains.
//!
//! The resolver walks the tree depth-first in pre-order. A child's absolute
//! path is the slash-join of its parent's absolute path and its own
//! relative segment; an index child resolves to exactly its parent's path.
//! Every node gets a [`ResolvedRoute`] so it can appear in descendant
//! ancestor chains, but only content-bearing nodes (those with a
//! component) are emitted as match targets.

use super::definition::RouteDefinition;
use anyhow::bail;
use std::sync::Arc;
use tracing::warn;

/// A route flattened to its absolute path, with the root-first chain of
/// enclosing routes. Immutable once built; rebuilt only when the authored
/// table's identity changes.
#[derive(Debug, Clone)]
pub struct ResolvedRoute {
    /// Absolute path (root-joined segments; index routes resolve to the
    /// exact parent path).
    pub path: String,
    /// The authored definition backing this route.
    pub definition: Arc<RouteDefinition>,
    /// Enclosing routes, root-first. Does not include the route itself.
    pub ancestors: Vec<Arc<ResolvedRoute>>,
}

/// Join a parent absolute path with a relative segment.
fn join_path(parent: &str, relative: &str) -> String {
    let rel = relative.trim_matches('/');
    if rel.is_empty() {
        return if parent.is_empty() {
            "/".to_string()
        } else {
            parent.to_string()
        };
    }
    let base = parent.trim_end_matches('/');
    format!("{base}/{rel}")
}

/// Flatten an authored route tree into match targets.
///
/// Validates the component-xor-children invariant along the way: the
/// builder cannot reject an invalid node at the type level, so a node
/// declaring both is refused here with the offending path named.
pub fn resolve_routes(roots: &[RouteDefinition]) -> anyhow::Result<Vec<Arc<ResolvedRoute>>> {
    let mut out = Vec::new();
    for root in roots {
        walk(root, "", &[], &mut out)?;
    }
    Ok(out)
}

fn walk(
    definition: &RouteDefinition,
    parent_path: &str,
    chain: &[Arc<ResolvedRoute>],
    out: &mut Vec<Arc<ResolvedRoute>>,
) -> anyhow::Result<()> {
    let path = match definition.relative_path() {
        Some(rel) => join_path(parent_path, rel),
        // Index marker: exactly the parent path, no appended segment.
        None => {
            if parent_path.is_empty() {
                "/".to_string()
            } else {
                parent_path.to_string()
            }
        }
    };

    let has_component = definition.get_component().is_some();
    let has_children = !definition.child_routes().is_empty();
    if has_component && has_children {
        bail!("route '{path}' declares both a component and children; a node carries one or the other");
    }
    if !has_component && !has_children {
        warn!(path = %path, "Route carries neither component nor children; it will never match");
    }

    let resolved = Arc::new(ResolvedRoute {
        path: path.clone(),
        definition: Arc::new(definition.clone()),
        ancestors: chain.to_vec(),
    });

    if has_component {
        out.push(Arc::clone(&resolved));
    }

    if has_children {
        let mut child_chain = chain.to_vec();
        child_chain.push(resolved);
        for child in definition.child_routes() {
            walk(child, &path, &child_chain, out)?;
        }
    }
    Ok(())
}
