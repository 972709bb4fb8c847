//! # Wayfarer
//!
//! **Wayfarer** is a coroutine-powered client-side navigation engine for
//! reactive UI trees, built on the `may` runtime.
//!
//! ## Overview
//!
//! Wayfarer turns a declaratively authored route tree into live navigation:
//! URL matching with typed parameters, per-route middleware, nested layout
//! composition, error/forbidden/loading/not-found boundaries, async render
//! offloading with anti-flicker policies, and scroll restoration across
//! history traversal. The host environment (a browser bridge, a test
//! harness) plugs in through a small set of platform provider traits.
//!
//! ## Architecture
//!
//! The library is organized into several key modules:
//!
//! - **[`route`]** - Route authoring, tree resolution, and route tables
//! - **[`matcher`]** - Trie-based URL matching with parameter extraction
//! - **[`middleware`]** - Per-route access control and prefetch tasks
//! - **[`boundary`]** - Nearest-wins fallback content resolution
//! - **[`outlet`]** - The render surface and async loading policies
//! - **[`nav`]** - The navigation controller, history, and scroll strategy
//! - **[`reactive`]** - The observable cell primitive backing all state
//! - **[`content`]** - Renderable content descriptors and render contexts
//! - **[`platform`]** - Host environment seams (history, storage, scroll, DOM)
//! - **[`service`]** - Route-scoped service module provisioning
//! - **[`decode`]** - Best-effort param and query decoding
//! - **[`context`]** - Execution-scoped access to the active controller
//!
//! ### Navigation Flow
//!
//! When a navigation lands, it flows through the engine like this:
//!
//! ```mermaid
//! sequenceDiagram
//!     participant App
//!     participant Controller as NavigationController
//!     participant Outlet
//!     participant Matcher
//!     participant Middleware as Middleware Chain
//!     participant Loader as AsyncLoader
//!
//!     App->>Controller: navigate("/users/:id", params)
//!     Controller->>Controller: Interpolate params,<br/>assemble query
//!     Controller->>Controller: Persist outgoing scroll,<br/>push history entry
//!     Controller->>Outlet: path cell publish
//!
//!     Outlet->>Matcher: match_path("/users/42")
//!     Matcher-->>Outlet: RouteMatch (route, params)
//!
//!     Outlet->>Middleware: run_pipeline(route, request)
//!     alt Redirect / Forbidden / Error
//!         Middleware-->>Outlet: halt result
//!         Outlet->>Outlet: Follow redirect or<br/>render nearest boundary
//!     end
//!     Middleware-->>Outlet: Continue
//!
//!     Outlet->>Outlet: Fire prefetch, decode fields,<br/>collect services
//!     Outlet->>Loader: present(match key, render)
//!     Loader->>Loader: Fallback or keep-stale,<br/>fork render coroutine
//!     Loader-->>Outlet: publish settled content
//!     Outlet->>Controller: apply_scroll(strategy)
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use wayfarer::content::{Content, Renderable};
//! use wayfarer::nav::{NavigateOptions, NavigationController};
//! use wayfarer::outlet::Outlet;
//! use wayfarer::platform::Platform;
//! use wayfarer::route::{RouteDefinition, RouteTable};
//!
//! let table = RouteTable::new(vec![
//!     RouteDefinition::index().component(Renderable::inline(Content::text("home"))),
//!     RouteDefinition::path("users/:id").component(Renderable::render(|ctx| {
//!         let id = ctx.raw_param("id").unwrap_or("?");
//!         Ok(Content::text(format!("user {id}")))
//!     })),
//! ])
//! .expect("route table");
//!
//! let controller = NavigationController::with_table(table, Platform::in_memory());
//! let outlet = Outlet::new(Arc::clone(&controller));
//! outlet.mount();
//!
//! controller.navigate("/users/42", NavigateOptions::default());
//! assert_eq!(outlet.output().get().flat_text(), "user 42");
//! ```
//!
//! ## Runtime Considerations
//!
//! Wayfarer uses the `may` coroutine runtime, not tokio or async-std:
//!
//! - Async renders and prefetch tasks run in coroutines (lightweight threads)
//! - Stack size is configurable via the `WAYFARER_STACK_SIZE` environment variable
//! - Blocking operations inside render functions should use `may`'s facilities

pub mod boundary;
pub mod content;
pub mod context;
pub mod decode;
pub mod matcher;
pub mod middleware;
pub mod nav;
pub mod outlet;
pub mod platform;
pub mod reactive;
pub mod route;
pub mod runtime_config;
pub mod service;

pub use content::{Content, RenderContext, Renderable};
pub use nav::{NavigateOptions, NavigationController, ScrollStrategy};
pub use outlet::{LoadingPolicy, Outlet};
pub use route::{RouteDefinition, RouteTable};
