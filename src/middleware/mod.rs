//! # Middleware Module
//!
//! Per-route access control for the navigation engine.
//!
//! A route's effective chain is its ancestors' tasks root-to-leaf plus its
//! own, run strictly sequentially. Each task allows the navigation or
//! halts it with one of two control-flow signals (`Redirect`, `Forbidden`)
//! or a domain error; the first non-success is the pipeline's result.
//! Task panics are contained and reclassified as errors.
//!
//! Prefetch tasks share the same request snapshot but run forked,
//! unordered and best-effort.

mod core;
mod pipeline;

pub use core::{
    FnMiddleware, FnPrefetch, Middleware, MiddlewareError, MiddlewareResult, NavRequest,
    PrefetchTask,
};
pub use pipeline::{fire_prefetch, run_pipeline};
