//! Route keys: method matchers and path patterns.

use std::fmt;

/// Marker that turns a registered path into a prefix (wildcard) route.
pub const WILDCARD_MARKER: char = '*';

/// Which request methods a route accepts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MethodMatcher {
    /// A single method, stored upper-cased (`GET`, `POST`, ...).
    Exact(String),
    /// The universal `*` method.
    Any,
}

impl MethodMatcher {
    /// Parse a method as written at registration time. `*` means any method.
    pub fn parse(method: &str) -> Self {
        let trimmed = method.trim();
        if trimmed == "*" {
            MethodMatcher::Any
        } else {
            MethodMatcher::Exact(trimmed.to_ascii_uppercase())
        }
    }

    /// Whether this matcher accepts the given request method.
    pub fn accepts(&self, method: &str) -> bool {
        match self {
            MethodMatcher::Any => true,
            MethodMatcher::Exact(m) => m.eq_ignore_ascii_case(method),
        }
    }

    pub fn is_any(&self) -> bool {
        matches!(self, MethodMatcher::Any)
    }
}

impl fmt::Display for MethodMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodMatcher::Exact(m) => f.write_str(m),
            MethodMatcher::Any => f.write_str("*"),
        }
    }
}

/// A registered path: either matched exactly or as a prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RoutePattern {
    Exact(String),
    /// Prefix with the wildcard marker already stripped.
    Prefix(String),
}

impl RoutePattern {
    /// Parse a registered path. A trailing `*` makes it a prefix route.
    pub fn parse(path: &str) -> Self {
        match path.strip_suffix(WILDCARD_MARKER) {
            Some(prefix) => RoutePattern::Prefix(prefix.to_string()),
            None => RoutePattern::Exact(path.to_string()),
        }
    }

    pub fn is_prefix(&self) -> bool {
        matches!(self, RoutePattern::Prefix(_))
    }

    /// The literal path text (without the wildcard marker).
    pub fn as_str(&self) -> &str {
        match self {
            RoutePattern::Exact(p) | RoutePattern::Prefix(p) => p,
        }
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutePattern::Exact(p) => f.write_str(p),
            RoutePattern::Prefix(p) => write!(f, "{p}{WILDCARD_MARKER}"),
        }
    }
}
