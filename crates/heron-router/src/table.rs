//! The routing table and its first-match lookup.

use std::collections::HashMap;

use http::Method;

use crate::params::Params;
use crate::template::{decode_path, PathTemplate};
use crate::verb::Verb;

/// One entry of a [`RoutingTable`].
#[derive(Debug, Clone)]
pub struct Route<T> {
    verb: Verb,
    template: PathTemplate,
    target: T,
}

impl<T> Route<T> {
    /// Returns the verb this route answers.
    #[must_use]
    pub fn verb(&self) -> Verb {
        self.verb
    }

    /// Returns the compiled template.
    #[must_use]
    pub fn template(&self) -> &PathTemplate {
        &self.template
    }

    /// Returns what the route dispatches to.
    #[must_use]
    pub fn target(&self) -> &T {
        &self.target
    }
}

/// A route selected for a request, together with its variable bindings.
#[derive(Debug)]
pub struct RouteMatch<'a, T> {
    /// The matched route.
    pub route: &'a Route<T>,
    /// Bindings extracted from the request path.
    pub params: Params,
}

impl<'a, T> RouteMatch<'a, T> {
    /// Returns what the matched route dispatches to.
    #[must_use]
    pub fn target(&self) -> &'a T {
        &self.route.target
    }
}

/// Routes in registration order, indexed by verb and template.
///
/// Lookup walks the routes registered for the request verb in the order they
/// were inserted and returns the first whose template matches the whole path.
/// Overlapping templates are therefore resolved by insertion order, not by
/// how specific a template is:
///
/// ```rust
/// use heron_router::{PathTemplate, RoutingTable, Verb};
///
/// let mut table = RoutingTable::new();
/// table.insert(Verb::Get, PathTemplate::parse("/items/{id}").unwrap(), "byId");
/// table.insert(Verb::Get, PathTemplate::parse("/items/special").unwrap(), "special");
///
/// // The variable route was registered first, so it shadows the literal one.
/// let found = table.match_route(Verb::Get, "/items/special").unwrap();
/// assert_eq!(*found.target(), "byId");
/// assert_eq!(found.params.get("id"), Some("special"));
/// ```
///
/// The table is immutable once built and is `Send + Sync` whenever `T` is,
/// so concurrent lookups need no locking.
#[derive(Debug, Clone)]
pub struct RoutingTable<T> {
    routes: Vec<Route<T>>,
    index: HashMap<(Verb, String), usize>,
}

impl<T> Default for RoutingTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RoutingTable<T> {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Inserts a route.
    ///
    /// A template may hold one route per verb. Inserting the same verb and
    /// template again replaces the earlier target in its original position
    /// and returns the replaced target.
    pub fn insert(&mut self, verb: Verb, template: PathTemplate, target: T) -> Option<T> {
        let key = (verb, template.as_str().to_string());

        if let Some(&slot) = self.index.get(&key) {
            let previous = std::mem::replace(&mut self.routes[slot].target, target);
            return Some(previous);
        }

        self.index.insert(key, self.routes.len());
        self.routes.push(Route {
            verb,
            template,
            target,
        });
        None
    }

    /// Returns `true` if a route exists for `verb` and `template`.
    #[must_use]
    pub fn contains(&self, verb: Verb, template: &str) -> bool {
        self.index.contains_key(&(verb, template.to_string()))
    }

    /// Returns the route registered for exactly `verb` and `template`.
    #[must_use]
    pub fn get(&self, verb: Verb, template: &str) -> Option<&Route<T>> {
        self.index
            .get(&(verb, template.to_string()))
            .map(|&slot| &self.routes[slot])
    }

    /// Finds the first route for `verb` whose template matches `path`.
    #[must_use]
    pub fn match_route(&self, verb: Verb, path: &str) -> Option<RouteMatch<'_, T>> {
        let path = decode_path(path);
        self.routes
            .iter()
            .filter(|route| route.verb == verb)
            .find_map(|route| {
                route
                    .template
                    .captures_decoded(&path)
                    .map(|params| RouteMatch { route, params })
            })
    }

    /// Like [`match_route`](Self::match_route) for a raw HTTP method.
    ///
    /// Methods outside the routable verb set never match.
    #[must_use]
    pub fn match_method(&self, method: &Method, path: &str) -> Option<RouteMatch<'_, T>> {
        let verb = Verb::from_method(method)?;
        self.match_route(verb, path)
    }

    /// Iterates over routes in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Route<T>> {
        self.routes.iter()
    }

    /// Returns the number of routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns `true` if the table has no routes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
