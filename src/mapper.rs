//! Applies per-version value mappers to a document in place.

use indexmap::IndexMap;
use log::trace;

use crate::block::Block;
use crate::error::{self, Result};
use crate::route::Route;
use crate::section::Section;
use crate::value::Value;

/// A user error escaping a mapper closure. Boxed so the crate's own `Error` stays a plain enum
/// rather than needing a type parameter for caller error types.
pub type MapperError = Box<dyn std::error::Error + Send + Sync>;
pub type MapperResult<T> = std::result::Result<T, MapperError>;

/// A transform applied to the raw value at one route, in one of three convenience flavors.
/// Exactly one flavor is invoked per mapper, chosen by which constructor built it.
pub enum ValueMapper {
    /// Sees only the stored value -- the common case.
    Value(Box<dyn Fn(&Value) -> MapperResult<Value> + Send + Sync>),
    /// Sees the whole block at the route (so it can distinguish an absent comment, etc).
    Block(Box<dyn Fn(&Block) -> MapperResult<Value> + Send + Sync>),
    /// Sees the whole document and the route being mapped, for mappers that need sibling context.
    SectionRoute(Box<dyn Fn(&Section, &Route) -> MapperResult<Value> + Send + Sync>),
}

impl ValueMapper {
    pub fn from_value(f: impl Fn(&Value) -> MapperResult<Value> + Send + Sync + 'static) -> ValueMapper {
        ValueMapper::Value(Box::new(f))
    }

    pub fn from_block(f: impl Fn(&Block) -> MapperResult<Value> + Send + Sync + 'static) -> ValueMapper {
        ValueMapper::Block(Box::new(f))
    }

    pub fn from_section_route(
        f: impl Fn(&Section, &Route) -> MapperResult<Value> + Send + Sync + 'static,
    ) -> ValueMapper {
        ValueMapper::SectionRoute(Box::new(f))
    }

    fn invoke(&self, doc: &Section, route: &Route, block: &Block) -> MapperResult<Value> {
        match self {
            ValueMapper::Value(f) => f(block.as_value().expect("mapper applies only to Entry blocks")),
            ValueMapper::Block(f) => f(block),
            ValueMapper::SectionRoute(f) => f(doc, route),
        }
    }
}

/// Runs every mapper in `mappers` (in its iteration order) against `doc`, for one version step.
///
/// Takes an iterator rather than a concrete container so callers merging a [`crate::route_map::RouteMap`]
/// of (non-`Clone`) mappers via `merge_ref` can pass the result straight through without an extra copy.
///
/// Per §4.H: a route whose block is absent is skipped; a mapper may return `Null`, which replaces
/// the prior value (the entry stays). Sections are left untouched -- a mapper replaces a raw
/// value, and a Section has none to replace.
pub fn apply<'a>(doc: &mut Section, mappers: impl IntoIterator<Item = (&'a Route, &'a ValueMapper)>) -> Result<()> {
    for (route, mapper) in mappers {
        let Some(block) = doc.get_block(route) else {
            trace!("Mapper route {} absent, skipping", route);
            continue;
        };
        if block.as_value().is_none() {
            trace!("Mapper route {} holds a section, skipping", route);
            continue;
        }
        let block_snapshot = block.clone();
        let new_value = mapper
            .invoke(doc, route, &block_snapshot)
            .map_err(|source| error::Error::MapperException {
                route: route.to_string(),
                source,
            })?;
        doc.set(route, new_value);
    }
    Ok(())
}
