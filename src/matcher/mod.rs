//! # Matcher Module
//!
//! Path matching for the navigation engine.
//!
//! ## Overview
//!
//! The matcher compiles a resolved route table into a segment trie and
//! matches the active URL against it, extracting named parameters. It is
//! built once per table identity and cached by each outlet; only a table
//! swap triggers recompilation.
//!
//! ## Precedence
//!
//! All full-length candidates are collected, then ranked:
//!
//! 1. More pattern segments beat fewer, regardless of segment kind.
//! 2. Higher precedence score wins at equal depth (static 3 > param 2 >
//!    required catch-all 1.5 > wildcard 1, plus 0.1 per segment).
//! 3. Remaining ties go to the first-registered route.
//!
//! ## Performance
//!
//! Matching is O(path depth): the trie branches at most three ways per
//! segment (static, param, wildcard), so work never grows with the number
//! of registered routes.

mod core;
mod trie;

pub use core::{Matcher, ParamVec, RouteMatch, MAX_INLINE_PARAMS};
