//! # Outlet Module
//!
//! The render surface: [`Outlet`] subscribes to navigation state and
//! publishes composed content, offloading async renders through
//! [`AsyncLoader`] under the route's [`LoadingPolicy`].

mod core;
mod loader;

pub use core::Outlet;
pub use loader::{AsyncLoader, LoadingPolicy};
