//! [`Section`]: an ordered mapping from key to [`Block`], with the traversal, mutation, and
//! typed-accessor operations that make up most of this crate's public surface.

use indexmap::IndexMap;
use log::trace;
use std::collections::HashSet;

use crate::block::{Block, Comments, Entry};
use crate::error::{self, Result};
use crate::route::{Key, Route};
use crate::value::{self, Value};

/// Whether a [`Section`]'s keys are arbitrary [`Key`] values or coerced to strings.
///
/// Set once, at the root, and inherited by every section created underneath it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyMode {
    Object,
    String,
}

/// What [`Section::get`] returns: the raw value for an `Entry`, or the `Section` itself.
pub enum Got<'a> {
    Value(&'a Value),
    Section(&'a Section),
}

/// What [`Section::set`] accepts: a raw value (auto-converted to a nested `Section` if it's a
/// JSON object), or an already-built `Section` to reattach verbatim.
pub enum SetValue {
    Raw(Value),
    Section(Section),
}

impl From<Value> for SetValue {
    fn from(v: Value) -> Self {
        SetValue::Raw(v)
    }
}

impl From<Section> for SetValue {
    fn from(s: Section) -> Self {
        SetValue::Section(s)
    }
}

/// An ordered map from key to [`Block`], forming one node of the config tree.
///
/// The root section has `name = None` and `route = None` (§3 invariant 3). Every other section's
/// `name`/`route` are re-derived after each structural mutation rather than held as live pointers
/// to a parent -- see the back-references design note in `SPEC_FULL.md`.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    key_mode: KeyMode,
    children: IndexMap<Key, Block>,
    comments: Comments,
    name: Option<Key>,
    route: Option<Route>,
    /// Direct child keys flagged to survive a merge's leftover-deletion pass even when
    /// `keep-all` is off (§4.J step 3).
    force_keep: HashSet<Key>,
}

impl Section {
    /// Creates a new, empty root section.
    pub fn root(key_mode: KeyMode) -> Section {
        Section {
            key_mode,
            children: IndexMap::new(),
            comments: Comments::default(),
            name: None,
            route: None,
            force_keep: HashSet::new(),
        }
    }

    /// Creates a new, empty, detached section inheriting `key_mode`. Its `name`/`route` are
    /// filled in once it's attached somewhere via [`Section::set`] or [`Section::create_section`].
    pub fn new_child(key_mode: KeyMode) -> Section {
        Section {
            key_mode,
            children: IndexMap::new(),
            comments: Comments::default(),
            name: None,
            route: None,
            force_keep: HashSet::new(),
        }
    }

    /// Flags a direct child key to survive merge's leftover-deletion pass even when `keep-all`
    /// is off.
    pub fn mark_force_keep(&mut self, key: impl Into<Key>) {
        let key = self.adapt_key(&key.into());
        self.force_keep.insert(key);
    }

    pub fn is_force_keep(&self, key: &Key) -> bool {
        let key = self.adapt_key(key);
        self.force_keep.contains(&key)
    }

    pub fn key_mode(&self) -> KeyMode {
        self.key_mode
    }

    pub fn is_root(&self) -> bool {
        self.route.is_none()
    }

    pub fn name(&self) -> Option<&Key> {
        self.name.as_ref()
    }

    /// This section's absolute route from the root it was last attached under, or `None` if it
    /// is the root (or has never been attached).
    pub fn route(&self) -> Option<&Route> {
        self.route.as_ref()
    }

    pub fn comments(&self) -> &Comments {
        &self.comments
    }

    pub fn comments_mut(&mut self) -> &mut Comments {
        &mut self.comments
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Direct child keys, in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.children.keys()
    }

    /// Direct children, in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (&Key, &Block)> {
        self.children.iter()
    }

    fn adapt_key(&self, key: &Key) -> Key {
        match self.key_mode {
            KeyMode::String => key.to_string_mode(),
            KeyMode::Object => key.clone(),
        }
    }

    // ---- Traversal -------------------------------------------------------

    pub fn contains(&self, route: &Route) -> bool {
        self.get_block(route).is_some()
    }

    pub fn get_block(&self, route: &Route) -> Option<&Block> {
        let key = self.adapt_key(route.get(0)?);
        let block = self.children.get(&key)?;
        if route.len() == 1 {
            Some(block)
        } else {
            block.as_section()?.get_block(&sub_route(route))
        }
    }

    pub fn get_block_mut(&mut self, route: &Route) -> Option<&mut Block> {
        let key = self.adapt_key(route.get(0)?);
        let block = self.children.get_mut(&key)?;
        if route.len() == 1 {
            Some(block)
        } else {
            block.as_section_mut()?.get_block_mut(&sub_route(route))
        }
    }

    fn get_section_mut(&mut self, route: &Route) -> Option<&mut Section> {
        self.get_block_mut(route)?.as_section_mut()
    }

    /// A direct child block, already adapted to this section's key mode. Used by [`crate::merger`]
    /// which walks matching sections level by level rather than via absolute routes.
    pub(crate) fn direct_child(&self, key: &Key) -> Option<&Block> {
        self.children.get(&self.adapt_key(key))
    }

    /// Inserts or replaces a direct child block, then reindexes descendants.
    pub(crate) fn set_direct_child(&mut self, key: Key, block: Block) {
        let key = self.adapt_key(&key);
        self.children.insert(key, block);
        self.reindex_children();
    }

    /// Removes a direct child block, then reindexes descendants.
    pub(crate) fn remove_direct_child(&mut self, key: &Key) -> Option<Block> {
        let key = self.adapt_key(key);
        let removed = self.children.shift_remove(&key);
        self.reindex_children();
        removed
    }

    /// Reorders this section's children to the given key order; any existing key absent from
    /// `order` keeps its relative position, appended after the ordered ones.
    pub(crate) fn reorder_children(&mut self, order: &[Key]) {
        let mut reordered = IndexMap::new();
        for key in order {
            if let Some(block) = self.children.shift_remove(key) {
                reordered.insert(key.clone(), block);
            }
        }
        for (key, block) in self.children.drain(..) {
            reordered.insert(key, block);
        }
        self.children = reordered;
    }

    pub fn get(&self, route: &Route) -> Option<Got<'_>> {
        match self.get_block(route)? {
            Block::Entry(e) => Some(Got::Value(&e.value)),
            Block::Section(s) => Some(Got::Section(s)),
        }
    }

    /// The section directly containing `route`'s last key: `self` if `route` has one key,
    /// otherwise the section at `route`'s parent.
    pub fn get_parent_section(&self, route: &Route) -> Option<&Section> {
        if route.len() == 1 {
            return Some(self);
        }
        let parent_route = route.parent().ok()?;
        self.get_block(&parent_route)?.as_section()
    }

    // ---- Enumeration -------------------------------------------------------

    /// All routes under this section. `deep = false` returns only direct children; `deep = true`
    /// recurses into subsections too, in depth-first, insertion order.
    pub fn routes(&self, deep: bool) -> Vec<Route> {
        let mut out = Vec::new();
        self.walk_routes(None, deep, &mut out);
        out
    }

    fn walk_routes(&self, prefix: Option<&Route>, deep: bool, out: &mut Vec<Route>) {
        for (key, block) in &self.children {
            let route = match prefix {
                Some(p) => p.add(key.clone()),
                None => Route::from_single_key(key.clone()),
            };
            out.push(route.clone());
            if deep {
                if let Block::Section(s) = block {
                    s.walk_routes(Some(&route), deep, out);
                }
            }
        }
    }

    /// Route -> raw value, for every `Entry` reachable (sections themselves are never included;
    /// see [`Section::route_mapped_blocks`] for that).
    pub fn route_mapped_values(&self, deep: bool) -> Vec<(Route, &Value)> {
        self.route_mapped_blocks(deep)
            .into_iter()
            .filter_map(|(r, b)| b.as_value().map(|v| (r, v)))
            .collect()
    }

    /// Route -> block, for every block reachable.
    pub fn route_mapped_blocks(&self, deep: bool) -> Vec<(Route, &Block)> {
        let mut out = Vec::new();
        self.walk_blocks(None, deep, &mut out);
        out
    }

    fn walk_blocks<'a>(&'a self, prefix: Option<&Route>, deep: bool, out: &mut Vec<(Route, &'a Block)>) {
        for (key, block) in &self.children {
            let route = match prefix {
                Some(p) => p.add(key.clone()),
                None => Route::from_single_key(key.clone()),
            };
            out.push((route.clone(), block));
            if deep {
                if let Block::Section(s) = block {
                    s.walk_blocks(Some(&route), deep, out);
                }
            }
        }
    }

    /// String-keyed equivalent of [`Section::routes`]. Fails with [`error::Error::KeyModeMismatch`]
    /// unless this section is in [`KeyMode::String`] mode.
    pub fn string_routes(&self, deep: bool, sep: char) -> Result<Vec<String>> {
        self.require_string_mode()?;
        Ok(self
            .routes(deep)
            .iter()
            .map(|r| r.join(sep).expect("string-mode route keys are all strings"))
            .collect())
    }

    pub fn string_route_mapped_values(&self, deep: bool, sep: char) -> Result<Vec<(String, &Value)>> {
        self.require_string_mode()?;
        Ok(self
            .route_mapped_values(deep)
            .into_iter()
            .map(|(r, v)| (r.join(sep).expect("string-mode route keys are all strings"), v))
            .collect())
    }

    pub fn string_route_mapped_blocks(&self, deep: bool, sep: char) -> Result<Vec<(String, &Block)>> {
        self.require_string_mode()?;
        Ok(self
            .route_mapped_blocks(deep)
            .into_iter()
            .map(|(r, b)| (r.join(sep).expect("string-mode route keys are all strings"), b))
            .collect())
    }

    fn require_string_mode(&self) -> Result<()> {
        if self.key_mode == KeyMode::String {
            Ok(())
        } else {
            error::KeyModeMismatchSnafu.fail()
        }
    }

    // ---- Mutation -------------------------------------------------------

    /// Sets the value at `route`, creating intermediate sections as needed.
    ///
    /// If `value` is a [`Section`], it's attached verbatim (reattaching detaches it from wherever
    /// it previously lived, since Rust's move semantics already guarantee unique ownership). If
    /// it's a JSON object, it's converted into a fresh `Section` in place. Otherwise it's wrapped
    /// in an `Entry`, preserving whatever comments already existed at `route`.
    pub fn set(&mut self, route: &Route, value: impl Into<SetValue>) {
        self.set_at(route, 0, value.into());
        self.reindex_children();
    }

    /// Attaches an already-built `Block` verbatim at `route`, creating intermediate sections
    /// along the way as needed, same as `set`'s object/value branches do -- but without
    /// re-deriving the block's comments from whatever used to be at `route`, since the whole
    /// point is to carry the block (and its comments) across unchanged.
    ///
    /// Returns the absolute routes of any sections created as scaffolding along the way (not
    /// including `route` itself), so a caller relocating a block on the document's behalf can
    /// distinguish a section it just synthesized from one that was already there.
    pub(crate) fn set_block(&mut self, route: &Route, block: Block) -> Vec<Route> {
        let mut created = Vec::new();
        self.set_block_at(route, 0, block, &mut created);
        self.reindex_children();
        created
    }

    fn set_block_at(&mut self, route: &Route, idx: usize, block: Block, created: &mut Vec<Route>) {
        let key = self.adapt_key(route.get(idx).expect("idx in bounds"));
        if idx == route.len() - 1 {
            self.children.insert(key, block);
        } else {
            let existed = matches!(self.children.get(&key), Some(b) if b.is_section());
            let child = self.ensure_section_at(key);
            if !existed {
                created.push(Route::from_keys(route.keys()[..=idx].to_vec()));
            }
            child.set_block_at(route, idx + 1, block, created);
        }
    }

    fn set_at(&mut self, route: &Route, idx: usize, value: SetValue) {
        let key = self.adapt_key(route.get(idx).expect("idx in bounds"));
        if idx == route.len() - 1 {
            match value {
                SetValue::Section(s) => {
                    trace!("Attaching section at key {:?}", key);
                    self.children.insert(key, Block::Section(s));
                }
                SetValue::Raw(Value::Object(map)) => {
                    let comments = self.children.get(&key).map(|b| b.comments().clone()).unwrap_or_default();
                    let mut section = Section::new_child(self.key_mode);
                    section.comments = comments;
                    for (k, v) in map {
                        section.set(&Route::from_single_key(Key::String(k)), v);
                    }
                    self.children.insert(key, Block::Section(section));
                }
                SetValue::Raw(v) => {
                    let comments = self.children.get(&key).map(|b| b.comments().clone()).unwrap_or_default();
                    self.children.insert(key, Block::Entry(Entry::with_comments(v, comments)));
                }
            }
        } else {
            let child = self.ensure_section_at(key);
            child.set_at(route, idx + 1, value);
        }
    }

    /// Returns the child section at `key`, creating it (or coercing whatever non-section block
    /// is there, migrating its comments) if necessary.
    fn ensure_section_at(&mut self, key: Key) -> &mut Section {
        let needs_new = match self.children.get(&key) {
            Some(b) => !b.is_section(),
            None => true,
        };
        if needs_new {
            let comments = self.children.get(&key).map(|b| b.comments().clone()).unwrap_or_default();
            let mut section = Section::new_child(self.key_mode);
            section.comments = comments;
            self.children.insert(key.clone(), Block::Section(section));
        }
        self.children
            .get_mut(&key)
            .and_then(Block::as_section_mut)
            .expect("just ensured a section is present")
    }

    /// Removes the block at `route`. Returns whether anything was removed.
    pub fn remove(&mut self, route: &Route) -> bool {
        let removed = self.remove_at(route, 0);
        self.reindex_children();
        removed
    }

    fn remove_at(&mut self, route: &Route, idx: usize) -> bool {
        let key = self.adapt_key(route.get(idx).expect("idx in bounds"));
        if idx == route.len() - 1 {
            self.children.shift_remove(&key).is_some()
        } else {
            match self.children.get_mut(&key).and_then(Block::as_section_mut) {
                Some(child) => child.remove_at(route, idx + 1),
                None => false,
            }
        }
    }

    pub fn clear(&mut self) {
        self.children.clear();
    }

    // ---- Creation -------------------------------------------------------

    /// Returns the section at `route`, creating empty sections along the path as needed.
    /// Preexisting non-section blocks along the path are replaced, but their comments migrate
    /// to the new section at that position.
    pub fn create_section(&mut self, route: &Route) -> &mut Section {
        self.create_section_at(route, 0);
        self.reindex_children();
        self.get_section_mut(route).expect("just created")
    }

    fn create_section_at(&mut self, route: &Route, idx: usize) {
        let key = self.adapt_key(route.get(idx).expect("idx in bounds"));
        let child = self.ensure_section_at(key);
        if idx < route.len() - 1 {
            child.create_section_at(route, idx + 1);
        }
    }

    /// Recomputes `name`/`route` for every descendant section, based on this section's own
    /// (unchanged) absolute route. Called once after any structural mutation.
    fn reindex_children(&mut self) {
        let base = self.route.clone();
        for (key, block) in self.children.iter_mut() {
            if let Block::Section(child) = block {
                let child_route = match &base {
                    Some(b) => b.add(key.clone()),
                    None => Route::from_single_key(key.clone()),
                };
                child.name = Some(key.clone());
                child.route = Some(child_route);
                child.reindex_children();
            }
        }
    }

    // ---- Typed accessors -------------------------------------------------------

    fn get_as<T>(&self, route: &Route, f: impl Fn(&Value) -> Option<T>) -> Option<T> {
        match self.get_block(route)? {
            Block::Entry(e) => f(&e.value),
            Block::Section(_) => None,
        }
    }
}

macro_rules! typed_accessor {
    ($get:ident, $get_or:ident, $ty:ty, $coerce:path) => {
        impl Section {
            pub fn $get(&self, route: &Route) -> Option<$ty> {
                self.get_as(route, $coerce)
            }

            pub fn $get_or(&self, route: &Route, default: $ty) -> $ty {
                self.$get(route).unwrap_or(default)
            }
        }
    };
}

typed_accessor!(get_as_string, get_as_string_or, String, value::as_string);
typed_accessor!(get_as_char, get_as_char_or, char, value::as_char);
typed_accessor!(get_as_bool, get_as_bool_or, bool, value::as_bool);
typed_accessor!(get_as_byte, get_as_byte_or, u8, value::as_u8);
typed_accessor!(get_as_short, get_as_short_or, i16, value::as_i16);
typed_accessor!(get_as_int, get_as_int_or, i32, value::as_i32);
typed_accessor!(get_as_long, get_as_long_or, i64, value::as_i64);
typed_accessor!(get_as_float, get_as_float_or, f32, value::as_f32);
typed_accessor!(get_as_double, get_as_double_or, f64, value::as_f64);
typed_accessor!(get_as_bigint, get_as_bigint_or, String, value::as_bigint_str);
typed_accessor!(get_as_list, get_as_list_or, Vec<Value>, value::as_list);

impl Section {
    /// A typed list: `None` unless every element coerces via `coerce`.
    pub fn get_as_typed_list<T>(&self, route: &Route, coerce: impl Fn(&Value) -> Option<T>) -> Option<Vec<T>> {
        self.get_as(route, |v| value::as_typed_list(v, &coerce))
    }

    pub fn get_as_typed_list_or<T>(
        &self,
        route: &Route,
        coerce: impl Fn(&Value) -> Option<T>,
        default: Vec<T>,
    ) -> Vec<T> {
        self.get_as_typed_list(route, coerce).unwrap_or(default)
    }
}

/// `route` with its first key dropped; used when descending into a child section.
fn sub_route(route: &Route) -> Route {
    Route::from_keys(route.keys()[1..].to_vec())
}
