/*!
# Background

Configuration consumers (services, CLIs, anything reading a settings document at startup) need
to take a user's existing document -- possibly written against an older schema -- and bring it up
to date with a newer defaults document, without discarding values the user deliberately set or
reordering sections the user is used to reading.

This library covers that: a version-aware migration pipeline (relocate routes, transform values,
run arbitrary mutators, once per intermediate schema version) followed by a structure-preserving
merge against the current defaults.

# Library

The central type is [`section::Section`]: a tree of [`block::Block`]s (either a raw [`value::Value`]
leaf or a nested `Section`), addressed by [`route::Route`]. A document is a `Section` at its root.

[`updater::update`] runs the full pipeline against a user document and a defaults document, given
an [`settings::UpdaterSettings`] built with [`settings::UpdaterSettingsBuilder`]. Versioning is
optional; a document's version is extracted with a type implementing [`versioning::Versioning`]
([`versioning::ManualVersioning`] for a version the caller already has on hand,
[`versioning::AutomaticVersioning`] to read it from a route in the document itself), advancing
version-by-version through a [`version::VersionPattern`].

# Values

We represent raw values using JSON (`serde_json::Value`, aliased as [`value::Value`]), for the same
reason the datastore this crate grew out of did: it's a convenient, arbitrary-precision,
human-readable representation for null/bool/number/string/list/map, with no format-specific
scalar-encoding quirks to work around.

# Current limitations

* Relocation, mapping, and mutation all run once per intermediate version in the same fixed order;
  there's no way to interleave them differently per version.
* There's no support for partial/streaming documents -- [`section::Section`] holds the whole tree
  in memory.
*/

pub mod block;
pub mod error;
pub mod mapper;
pub mod merger;
pub mod mutator;
pub mod relocator;
pub mod route;
pub mod route_map;
pub mod section;
pub mod settings;
pub mod updater;
pub mod value;
pub mod version;
pub mod versioning;

pub use block::{Block, Comments, Entry};
pub use error::{Error, Result};
pub use mapper::{MapperError, MapperResult, ValueMapper};
pub use merger::{MergeClassification, MergeOptions, MergeRules, OptionSorting};
pub use mutator::Mutator;
pub use route::{Key, Route, RouteFactory};
pub use route_map::{RouteMap, RouteSet};
pub use section::{KeyMode, Section};
pub use settings::{UpdaterSettings, UpdaterSettingsBuilder};
pub use updater::update;
pub use value::Value;
pub use version::{Version, VersionPattern};
pub use versioning::{AutomaticVersioning, ManualVersioning, Versioning};
