//! # Navigation Module
//!
//! Imperative navigation surface: [`NavigationController`] owns the
//! current-route state and history operations, and [`ScrollStrategy`]
//! configures per-route scroll behavior applied after render.

mod controller;
mod scroll;

pub use controller::{NavigateOptions, NavigationContext, NavigationController};
pub(crate) use controller::split_location;
pub use scroll::ScrollStrategy;
