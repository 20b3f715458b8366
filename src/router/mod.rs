//! Route table: ordered, per-method pattern lists.
//!
//! The table is built once at startup from the declarative route list and is
//! read-only while serving; a reload builds a complete replacement table and
//! swaps it in atomically (see [`crate::hot_reload`]). Lookup walks one
//! method's patterns in registration order and returns the first match —
//! route counts are small (tens to low hundreds), and first-match-wins is
//! the contract declaration files rely on, so the linear scan is deliberate.

mod core;

pub use self::core::{RouteMatch, RoutePattern, RouteTable, RouteTarget};
pub use crate::pattern::{ParamVec, MAX_INLINE_PARAMS};
