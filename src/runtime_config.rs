//! # Runtime Configuration Module
//!
//! Environment-variable configuration for the coroutine runtime.
//!
//! ## Environment Variables
//!
//! ### `WAYFARER_STACK_SIZE`
//!
//! Stack size for forked coroutines (async-loader renders, prefetch
//! fan-out). Accepts decimal (`16384`) or hexadecimal (`0x4000`) values.
//! Default: `0x4000` (16 KB).
//!
//! Larger stacks support deeper render trees; smaller stacks reduce memory
//! when many outlets render concurrently. Tune based on component depth.

use once_cell::sync::Lazy;
use std::env;

static GLOBAL: Lazy<RuntimeConfig> = Lazy::new(RuntimeConfig::from_env);

/// Runtime configuration loaded from environment variables.
///
/// Load at startup with [`RuntimeConfig::from_env()`].
#[derive(Debug, Clone, Copy)]
pub struct RuntimeConfig {
    /// Stack size for forked coroutines in bytes (default: 16 KB / 0x4000).
    pub stack_size: usize,
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let stack_size = match env::var("WAYFARER_STACK_SIZE") {
            Ok(val) => {
                if let Some(hex) = val.strip_prefix("0x") {
                    usize::from_str_radix(hex, 16).unwrap_or(0x4000)
                } else {
                    val.parse().unwrap_or(0x4000)
                }
            }
            Err(_) => 0x4000,
        };
        RuntimeConfig { stack_size }
    }

    /// Process-wide configuration, read from the environment once on first
    /// access.
    #[must_use]
    pub fn global() -> Self {
        *GLOBAL
    }
}
