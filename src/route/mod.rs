//! # Route Module
//!
//! Route authoring and resolution.
//!
//! - [`RouteDefinition`] - the immutable, builder-produced route node
//! - [`resolve_routes`] - pre-order flattening into absolute-path
//!   [`ResolvedRoute`] records with root-first ancestor chains
//! - [`RouteTable`] - a resolved tree with a stable identity used to
//!   memoize the compiled matcher
//!
//! Resolution happens once per table build, never per navigation.

mod definition;
mod resolver;
mod table;

pub use definition::RouteDefinition;
pub use resolver::{resolve_routes, ResolvedRoute};
pub use table::RouteTable;
