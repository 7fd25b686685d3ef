//! Dual-view containers holding both route-keyed and string-keyed entries, merged on demand.
//!
//! [`RouteMap`] and [`RouteSet`] back the per-version maps in [`crate::settings::UpdaterSettings`]
//! (ignored routes, relocations, mappers). Most callers only ever populate one view or the other,
//! so each inner container is allocated lazily; constructing a `RouteMap`/`RouteSet` itself
//! performs no allocation.
//!
//! Both views preserve insertion order (`IndexMap`/`IndexSet`, not `HashMap`/`HashSet`): the
//! relocator depends on iterating the merged route-keyed view in a stable order to break ties
//! between relocations that target the same route.

use indexmap::{IndexMap, IndexSet};

use crate::route::Route;

/// A map keyed by either [`Route`] or a separator-joined `String`.
#[derive(Debug, Clone)]
pub struct RouteMap<V> {
    route_keyed: Option<IndexMap<Route, V>>,
    string_keyed: Option<IndexMap<String, V>>,
}

// Hand-written rather than `#[derive(Default)]`: the derive macro adds a spurious `V: Default`
// bound even though every field here defaults via `Option::None` regardless of `V`.
impl<V> Default for RouteMap<V> {
    fn default() -> Self {
        RouteMap {
            route_keyed: None,
            string_keyed: None,
        }
    }
}

impl<V> RouteMap<V> {
    pub fn new() -> Self {
        RouteMap::default()
    }

    pub fn route_keyed(&self) -> Option<&IndexMap<Route, V>> {
        self.route_keyed.as_ref()
    }

    pub fn string_keyed(&self) -> Option<&IndexMap<String, V>> {
        self.string_keyed.as_ref()
    }

    /// Inserts a route-keyed entry, allocating the route-keyed submap if this is the first one.
    pub fn insert_route(&mut self, route: Route, value: V) -> Option<V> {
        self.route_keyed.get_or_insert_with(IndexMap::new).insert(route, value)
    }

    /// Inserts a string-keyed entry, allocating the string-keyed submap if this is the first one.
    pub fn insert_string(&mut self, key: impl Into<String>, value: V) -> Option<V> {
        self.string_keyed
            .get_or_insert_with(IndexMap::new)
            .insert(key.into(), value)
    }

    pub fn is_empty(&self) -> bool {
        self.route_keyed.as_ref().map_or(true, IndexMap::is_empty)
            && self.string_keyed.as_ref().map_or(true, IndexMap::is_empty)
    }

    /// Like [`RouteMap::merge`], but consumes `self` instead of cloning values — for a `V` that
    /// isn't `Clone` (e.g. the boxed closures a value mapper wraps).
    pub fn merge_owned(self, sep: char) -> IndexMap<Route, V> {
        let mut result = IndexMap::new();
        if let Some(string_keyed) = self.string_keyed {
            for (s, v) in string_keyed {
                result.insert(Route::from_string(&s, sep), v);
            }
        }
        if let Some(route_keyed) = self.route_keyed {
            for (r, v) in route_keyed {
                result.shift_remove(&r);
                result.insert(r, v);
            }
        }
        result
    }
}

impl<V> RouteMap<V> {
    /// Like [`RouteMap::merge`], but borrows instead of cloning or consuming -- for a `V` that's
    /// neither `Clone` nor owned by the caller at this point (e.g. a mapper stored by reference
    /// in a settings snapshot used across more than one update).
    pub fn merge_ref(&self, sep: char) -> IndexMap<Route, &V> {
        let mut result = IndexMap::new();
        if let Some(string_keyed) = &self.string_keyed {
            for (s, v) in string_keyed {
                result.insert(Route::from_string(s, sep), v);
            }
        }
        if let Some(route_keyed) = &self.route_keyed {
            for (r, v) in route_keyed {
                result.shift_remove(r);
                result.insert(r.clone(), v);
            }
        }
        result
    }
}

impl<V: Clone> RouteMap<V> {
    /// Materializes a single route-keyed map: string entries are parsed with `sep` first, then
    /// route entries are inserted, overwriting any string-derived entry at an equal route.
    /// Iteration order of the result is string entries (in their insertion order) followed by
    /// route entries (in their insertion order), so the last-inserted entry for a given route
    /// wins both in value and in final position.
    ///
    /// Does not mutate either inner container.
    pub fn merge(&self, sep: char) -> IndexMap<Route, V> {
        let mut result = IndexMap::new();
        if let Some(string_keyed) = &self.string_keyed {
            for (s, v) in string_keyed {
                result.insert(Route::from_string(s, sep), v.clone());
            }
        }
        if let Some(route_keyed) = &self.route_keyed {
            for (r, v) in route_keyed {
                result.shift_remove(r);
                result.insert(r.clone(), v.clone());
            }
        }
        result
    }
}

/// A set of either [`Route`]s or separator-joined `String`s.
#[derive(Debug, Default, Clone)]
pub struct RouteSet {
    route_keyed: Option<IndexSet<Route>>,
    string_keyed: Option<IndexSet<String>>,
}

impl RouteSet {
    pub fn new() -> Self {
        RouteSet {
            route_keyed: None,
            string_keyed: None,
        }
    }

    pub fn insert_route(&mut self, route: Route) -> bool {
        self.route_keyed.get_or_insert_with(IndexSet::new).insert(route)
    }

    pub fn insert_string(&mut self, key: impl Into<String>) -> bool {
        self.string_keyed.get_or_insert_with(IndexSet::new).insert(key.into())
    }

    pub fn is_empty(&self) -> bool {
        self.route_keyed.as_ref().map_or(true, IndexSet::is_empty)
            && self.string_keyed.as_ref().map_or(true, IndexSet::is_empty)
    }

    /// Materializes a single route-keyed set; string entries are parsed with `sep`.
    pub fn merge(&self, sep: char) -> IndexSet<Route> {
        let mut result = IndexSet::new();
        if let Some(string_keyed) = &self.string_keyed {
            for s in string_keyed {
                result.insert(Route::from_string(s, sep));
            }
        }
        if let Some(route_keyed) = &self.route_keyed {
            for r in route_keyed {
                result.insert(r.clone());
            }
        }
        result
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn empty_map_merges_to_empty() {
        let m: RouteMap<u32> = RouteMap::new();
        assert!(m.merge('.').is_empty());
    }

    #[test]
    fn no_allocation_until_first_insert() {
        let m: RouteMap<u32> = RouteMap::new();
        assert!(m.route_keyed().is_none());
        assert!(m.string_keyed().is_none());
    }

    #[test]
    fn route_keyed_overrides_string_keyed_on_collision() {
        let mut m: RouteMap<&str> = RouteMap::new();
        m.insert_string("a.b", "from-string");
        m.insert_route(Route::from_string("a.b", '.'), "from-route");
        let merged = m.merge('.');
        assert_eq!(merged.get(&Route::from_string("a.b", '.')), Some(&"from-route"));
    }

    #[test]
    fn merge_owned_overrides_string_keyed_on_collision() {
        let mut m: RouteMap<String> = RouteMap::new();
        m.insert_string("a.b", "from-string".to_string());
        m.insert_route(Route::from_string("a.b", '.'), "from-route".to_string());
        let merged = m.merge_owned('.');
        assert_eq!(merged.get(&Route::from_string("a.b", '.')), Some(&"from-route".to_string()));
    }

    #[test]
    fn merge_ref_overrides_string_keyed_on_collision() {
        let mut m: RouteMap<String> = RouteMap::new();
        m.insert_string("a.b", "from-string".to_string());
        m.insert_route(Route::from_string("a.b", '.'), "from-route".to_string());
        let merged = m.merge_ref('.');
        assert_eq!(merged.get(&Route::from_string("a.b", '.')), Some(&&"from-route".to_string()));
    }

    #[test]
    fn set_merge_unions_both_views() {
        let mut s = RouteSet::new();
        s.insert_string("a");
        s.insert_route(Route::from_string("b", '.'));
        let merged = s.merge('.');
        assert_eq!(merged.len(), 2);
        assert!(merged.contains(&Route::from_string("a", '.')));
        assert!(merged.contains(&Route::from_string("b", '.')));
    }
}
