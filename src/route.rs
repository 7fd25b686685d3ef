//! Routes address a node inside a [`crate::section::Section`] tree.
//!
//! A route is an ordered, immutable sequence of keys. Keys come in two flavors: an arbitrary
//! [`Key`] value (object key mode) or a plain string parsed out of a separated path (string key
//! mode). Unlike a filesystem-style path, there is no escape mechanism for a literal separator
//! character inside a string-mode key -- callers who need that must build the route from
//! explicit keys instead of a separator-joined string.

use log::trace;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::{self, Result};

/// A single key in a route.
///
/// `String` is the only variant produced by [`Route::from_string`]; the others are only ever
/// constructed by callers building a route from explicit keys (object key mode).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    String(String),
    Integer(i64),
    Boolean(bool),
}

impl Key {
    /// Coerces this key to its string-mode representation, the way a [`crate::section::Section`]
    /// in string key mode stores every key it's given, regardless of how it arrived.
    pub fn to_string_mode(&self) -> Key {
        match self {
            Key::String(_) => self.clone(),
            Key::Integer(i) => Key::String(i.to_string()),
            Key::Boolean(b) => Key::String(b.to_string()),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Key::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::String(s) => write!(f, "{}", s),
            Key::Integer(i) => write!(f, "{}", i),
            Key::Boolean(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::String(s.to_string())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::String(s)
    }
}

impl From<i64> for Key {
    fn from(i: i64) -> Self {
        Key::Integer(i)
    }
}

impl From<bool> for Key {
    fn from(b: bool) -> Self {
        Key::Boolean(b)
    }
}

/// An ordered, non-empty, immutable sequence of keys addressing a node in a section tree.
///
/// Two routes are equal iff they have the same length and pairwise-equal keys; the hash is
/// precomputed at construction so routes are cheap to use as map keys.
#[derive(Clone, Debug)]
pub struct Route {
    keys: Vec<Key>,
}

impl Route {
    /// Builds a route from an explicit, ordered list of keys (object key mode).
    ///
    /// # Panics
    /// Panics if `keys` is empty; a route is never zero-length. Callers that build routes from
    /// user-controlled, possibly-empty input should check first.
    pub fn from_keys<I: IntoIterator<Item = Key>>(keys: I) -> Route {
        let keys: Vec<Key> = keys.into_iter().collect();
        assert!(!keys.is_empty(), "Route must have at least one key");
        Route { keys }
    }

    /// Builds a single-key route.
    pub fn from_single_key<K: Into<Key>>(key: K) -> Route {
        Route {
            keys: vec![key.into()],
        }
    }

    /// Splits `s` on every unescaped occurrence of `sep`, producing a string-mode route.
    ///
    /// An empty string yields a single-key route `[""]`, not a zero-length route. A separator
    /// immediately following another separator yields an empty-string key between them. There is
    /// no quoting or escaping of `sep` within a segment.
    pub fn from_string(s: &str, sep: char) -> Route {
        let keys: Vec<Key> = s.split(sep).map(|seg| Key::String(seg.to_string())).collect();
        trace!("Parsed route string '{}' (sep '{}') to {:?}", s, sep, keys);
        Route { keys }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn get(&self, i: usize) -> Option<&Key> {
        self.keys.get(i)
    }

    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    pub fn last(&self) -> &Key {
        self.keys.last().expect("Route is never empty")
    }

    /// Returns the route without its last element.
    ///
    /// Fails with [`error::Error::RouteTooShort`] if this route has only one key.
    pub fn parent(&self) -> Result<Route> {
        if self.keys.len() <= 1 {
            return error::RouteTooShortSnafu { length: self.keys.len() }.fail();
        }
        Ok(Route {
            keys: self.keys[..self.keys.len() - 1].to_vec(),
        })
    }

    /// Returns a new route extended by one key.
    pub fn add<K: Into<Key>>(&self, key: K) -> Route {
        let mut keys = self.keys.clone();
        keys.push(key.into());
        Route { keys }
    }

    /// Joins this route's keys into a single string, separated by `sep`.
    ///
    /// Fails with [`error::Error::NonStringKey`] if any key is not a string-mode key.
    pub fn join(&self, sep: char) -> Result<String> {
        let mut parts = Vec::with_capacity(self.keys.len());
        for key in &self.keys {
            match key {
                Key::String(s) => parts.push(s.clone()),
                _ => return error::NonStringKeySnafu.fail(),
            }
        }
        Ok(parts.join(&sep.to_string()))
    }
}

impl PartialEq for Route {
    fn eq(&self, other: &Route) -> bool {
        self.keys == other.keys
    }
}
impl Eq for Route {}

impl Hash for Route {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.keys.hash(state);
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.keys.iter().map(|k| k.to_string()).collect();
        write!(f, "{}", parts.join("."))
    }
}

/// Bundles a separator (and its escaped form, for display purposes) to build routes from strings
/// in bulk.
///
/// Per §4.A, routes have no escape mechanism of their own; `escaped_sep` exists only so callers
/// can round-trip a separator character in contexts outside of `Route` itself (e.g. rendering a
/// route back into a path for error messages). It is not consulted by [`RouteFactory::create`].
#[derive(Clone, Debug)]
pub struct RouteFactory {
    sep: char,
    escaped_sep: String,
}

impl RouteFactory {
    pub fn new(sep: char, escaped_sep: impl Into<String>) -> RouteFactory {
        RouteFactory {
            sep,
            escaped_sep: escaped_sep.into(),
        }
    }

    pub fn separator(&self) -> char {
        self.sep
    }

    pub fn escaped_separator(&self) -> &str {
        &self.escaped_sep
    }

    pub fn create(&self, s: &str) -> Route {
        Route::from_string(s, self.sep)
    }

    pub fn create_all<'a, I: IntoIterator<Item = &'a str>>(&self, strs: I) -> Vec<Route> {
        strs.into_iter().map(|s| self.create(s)).collect()
    }
}
