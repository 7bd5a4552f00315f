//! Request routing rules.
//!
//! - [`pattern::MethodMatcher`] / [`pattern::RoutePattern`]: route keys
//! - [`table::RouteTable`]: lookup with exact-before-prefix precedence

pub mod pattern;
pub mod table;

pub use pattern::{MethodMatcher, RoutePattern, WILDCARD_MARKER};
pub use table::{ResolvedRoute, RouteInfo, RouteTable};
