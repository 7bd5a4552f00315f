//! Route table with deterministic lookup precedence.
//!
//! Lookup order, most to least specific:
//!
//! 1. exact method + exact path
//! 2. any method (`*`) + exact path
//! 3. longest prefix registered for the exact method
//! 4. longest prefix registered for any method
//!
//! Exact routes always outrank prefix routes regardless of length, and the
//! order in which routes were registered never changes the outcome.

use super::pattern::{MethodMatcher, RoutePattern};
use percent_encoding::percent_decode_str;
use std::collections::{BTreeMap, HashMap};

/// Registered route key, as shown in listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteInfo {
    pub method: MethodMatcher,
    pub pattern: RoutePattern,
}

/// Result of a successful lookup.
#[derive(Debug)]
pub struct ResolvedRoute<'a, H> {
    pub handler: &'a H,
    pub route: RouteInfo,
    /// Percent-decoded tail of the path beyond a matched prefix; empty for
    /// exact matches.
    pub wildcard_remainder: String,
}

/// In-memory map from `(method, path-or-prefix)` to a handler.
#[derive(Debug)]
pub struct RouteTable<H> {
    exact: HashMap<(MethodMatcher, String), H>,
    // BTreeMap keeps listings stable; lookups never depend on its order.
    prefixes: BTreeMap<(MethodMatcher, String), H>,
}

impl<H> Default for RouteTable<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> RouteTable<H> {
    pub fn new() -> Self {
        Self {
            exact: HashMap::new(),
            prefixes: BTreeMap::new(),
        }
    }

    /// Register a handler. Registering the same key twice replaces the
    /// previous handler and returns it.
    pub fn register(&mut self, method: &str, path_or_prefix: &str, handler: H) -> Option<H> {
        let method = MethodMatcher::parse(method);
        match RoutePattern::parse(path_or_prefix) {
            RoutePattern::Exact(path) => self.exact.insert((method, path), handler),
            RoutePattern::Prefix(prefix) => self.prefixes.insert((method, prefix), handler),
        }
    }

    pub fn can_handle(&self, method: &str, path: &str) -> bool {
        self.resolve(method, path).is_some()
    }

    /// Find the handler for a request, honoring the precedence rules.
    pub fn resolve(&self, method: &str, path: &str) -> Option<ResolvedRoute<'_, H>> {
        let exact_method = MethodMatcher::parse(method);
        if exact_method.is_any() {
            // A literal `*` request method only reaches universal routes.
            return self.resolve_for(&MethodMatcher::Any, path);
        }

        if let Some(handler) = self.exact.get(&(exact_method.clone(), path.to_string())) {
            return Some(exact_hit(handler, exact_method, path));
        }
        if let Some(handler) = self.exact.get(&(MethodMatcher::Any, path.to_string())) {
            return Some(exact_hit(handler, MethodMatcher::Any, path));
        }

        self.longest_prefix(&exact_method, path)
            .or_else(|| self.longest_prefix(&MethodMatcher::Any, path))
    }

    fn resolve_for(&self, matcher: &MethodMatcher, path: &str) -> Option<ResolvedRoute<'_, H>> {
        if let Some(handler) = self.exact.get(&(matcher.clone(), path.to_string())) {
            return Some(exact_hit(handler, matcher.clone(), path));
        }
        self.longest_prefix(matcher, path)
    }

    fn longest_prefix(&self, matcher: &MethodMatcher, path: &str) -> Option<ResolvedRoute<'_, H>> {
        self.prefixes
            .iter()
            .filter(|((m, prefix), _)| m == matcher && path.starts_with(prefix.as_str()))
            .max_by_key(|((_, prefix), _)| prefix.len())
            .map(|((m, prefix), handler)| ResolvedRoute {
                handler,
                route: RouteInfo {
                    method: m.clone(),
                    pattern: RoutePattern::Prefix(prefix.clone()),
                },
                wildcard_remainder: percent_decode_str(&path[prefix.len()..])
                    .decode_utf8_lossy()
                    .into_owned(),
            })
    }

    /// All registered routes, exact routes first, each group sorted.
    pub fn routes(&self) -> Vec<RouteInfo> {
        let mut exact: Vec<RouteInfo> = self
            .exact
            .keys()
            .map(|(method, path)| RouteInfo {
                method: method.clone(),
                pattern: RoutePattern::Exact(path.clone()),
            })
            .collect();
        exact.sort_by(|a, b| (&a.pattern, &a.method).cmp(&(&b.pattern, &b.method)));

        let prefixes = self.prefixes.keys().map(|(method, prefix)| RouteInfo {
            method: method.clone(),
            pattern: RoutePattern::Prefix(prefix.clone()),
        });

        exact.into_iter().chain(prefixes).collect()
    }

    pub fn len(&self) -> usize {
        self.exact.len() + self.prefixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn exact_hit<'a, H>(handler: &'a H, method: MethodMatcher, path: &str) -> ResolvedRoute<'a, H> {
    ResolvedRoute {
        handler,
        route: RouteInfo {
            method,
            pattern: RoutePattern::Exact(path.to_string()),
        },
        wildcard_remainder: String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved(table: &RouteTable<&'static str>, method: &str, path: &str) -> Option<&'static str> {
        table.resolve(method, path).map(|r| *r.handler)
    }

    #[test]
    fn exact_route_beats_wildcard() {
        let mut table = RouteTable::new();
        table.register("POST", "/a/*", "wildcard");
        table.register("POST", "/a/b", "exact");

        assert_eq!(resolved(&table, "POST", "/a/b"), Some("exact"));
        assert_eq!(resolved(&table, "POST", "/a/c"), Some("wildcard"));
    }

    #[test]
    fn method_specific_wildcard_beats_universal_wildcard() {
        let mut table = RouteTable::new();
        table.register("*", "/x/*", "any");
        table.register("GET", "/x/*", "get");

        assert_eq!(resolved(&table, "GET", "/x/y"), Some("get"));
        assert_eq!(resolved(&table, "POST", "/x/y"), Some("any"));
    }

    #[test]
    fn universal_exact_beats_method_specific_prefix() {
        let mut table = RouteTable::new();
        table.register("GET", "/*", "get-prefix");
        table.register("*", "/version", "any-exact");

        assert_eq!(resolved(&table, "GET", "/version"), Some("any-exact"));
    }

    #[test]
    fn longest_prefix_wins_regardless_of_registration_order() {
        let mut forward = RouteTable::new();
        forward.register("GET", "/user/*", "short");
        forward.register("GET", "/user/files/*", "long");

        let mut reverse = RouteTable::new();
        reverse.register("GET", "/user/files/*", "long");
        reverse.register("GET", "/user/*", "short");

        for table in [&forward, &reverse] {
            assert_eq!(resolved(table, "GET", "/user/files/a.png"), Some("long"));
            assert_eq!(resolved(table, "GET", "/user/avatars/a.png"), Some("short"));
        }
    }

    #[test]
    fn wildcard_remainder_is_percent_decoded() {
        let mut table = RouteTable::new();
        table.register("GET", "/user/files/*", "files");

        let hit = table.resolve("get", "/user/files/my%20notes/%E3%81%82.txt").unwrap();
        assert_eq!(hit.wildcard_remainder, "my notes/あ.txt");
        assert!(hit.route.pattern.is_prefix());
    }

    #[test]
    fn exact_match_has_empty_remainder() {
        let mut table = RouteTable::new();
        table.register("POST", "/api/chats/save", "save");
        let hit = table.resolve("POST", "/api/chats/save").unwrap();
        assert!(hit.wildcard_remainder.is_empty());
    }

    #[test]
    fn unmatched_method_falls_through() {
        let mut table = RouteTable::new();
        table.register("POST", "/api/chats/save", "save");
        assert!(!table.can_handle("GET", "/api/chats/save"));
        assert!(!table.can_handle("POST", "/api/chats/save/extra"));
    }

    #[test]
    fn re_registration_replaces_handler() {
        let mut table = RouteTable::new();
        assert!(table.register("GET", "/version", "v1").is_none());
        assert_eq!(table.register("get", "/version", "v2"), Some("v1"));
        assert_eq!(table.len(), 1);
        assert_eq!(resolved(&table, "GET", "/version"), Some("v2"));
    }

    #[test]
    fn listing_puts_exact_routes_first() {
        let mut table = RouteTable::new();
        table.register("GET", "/user/files/*", 1);
        table.register("POST", "/api/chats/save", 2);
        let routes = table.routes();
        assert_eq!(routes.len(), 2);
        assert!(!routes[0].pattern.is_prefix());
        assert!(routes[1].pattern.is_prefix());
    }
}
