//! Applies per-version route relocations (`from -> to` rewrites) to a document in place.

use indexmap::IndexMap;
use log::{debug, trace};
use std::collections::HashSet;

use crate::block::Block;
use crate::route::Route;
use crate::section::Section;

/// Applies every relocation in `relocations` (already merged into a single route-keyed view, in
/// the iteration order ties should break by) to `doc`, for one version step.
///
/// Mirrors §4.G: relocations targeting an already-relocated-but-not-yet-moved slot are chased
/// depth-first first, each visited entry marked applied so a relocation cycle terminates instead
/// of looping.
///
/// `created_sections` records the absolute routes of every section this (or an earlier) call has
/// synthesized purely as scaffolding for a relocation's `to` path -- an empty section left behind
/// by a relocated-away block is only pruned if it's in this set, never if it was already present
/// in the document beforehand. Callers running the full version-by-version pipeline pass the same
/// set across every version's `apply` call, since a section scaffolded at one version may not be
/// drained again until a later one.
pub fn apply(doc: &mut Section, relocations: &IndexMap<Route, Route>, created_sections: &mut HashSet<Route>) {
    let mut applied: HashSet<Route> = HashSet::new();
    for from in relocations.keys() {
        apply_one(doc, relocations, from, &mut applied, created_sections);
    }
}

fn apply_one(
    doc: &mut Section,
    relocations: &IndexMap<Route, Route>,
    from: &Route,
    applied: &mut HashSet<Route>,
    created_sections: &mut HashSet<Route>,
) {
    if applied.contains(from) {
        return;
    }
    applied.insert(from.clone());

    let Some(to) = relocations.get(from) else {
        return;
    };

    if !doc.contains(from) {
        trace!("Relocation source {} absent, skipping", from);
        return;
    }

    // If `to` is itself an un-applied relocation source, chase it first so the slot frees up.
    if let Some(chained_from) = relocations.get_key_value(to).map(|(k, _)| k.clone()) {
        if !applied.contains(&chained_from) {
            apply_one(doc, relocations, &chained_from, applied, created_sections);
        }
    }

    let block = take_block(doc, from, created_sections);
    let Some(block) = block else {
        return;
    };

    debug!("Relocating {} -> {}", from, to);
    let new_scaffolding = doc.set_block(to, block);
    created_sections.extend(new_scaffolding);
}

/// Removes and returns the block at `from`, pruning `from`'s parent section if doing so leaves it
/// empty and that parent is in `created_sections` -- i.e. it exists only because an earlier
/// relocation step synthesized it along a `to` path. An originally-present section is left alone
/// even if detaching `from` empties it out entirely.
fn take_block(doc: &mut Section, from: &Route, created_sections: &HashSet<Route>) -> Option<Block> {
    let block = doc.get_block(from)?.clone();
    doc.remove(from);
    if let Ok(parent_route) = from.parent() {
        let parent_now_empty = matches!(doc.get_block(&parent_route), Some(Block::Section(s)) if s.is_empty());
        if parent_now_empty && created_sections.contains(&parent_route) {
            doc.remove(&parent_route);
        }
    }
    Some(block)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::section::KeyMode;
    use serde_json::json;

    fn route(s: &str) -> Route {
        Route::from_string(s, '.')
    }

    fn apply_fresh(doc: &mut Section, relocations: &IndexMap<Route, Route>) {
        apply(doc, relocations, &mut HashSet::new());
    }

    #[test]
    fn simple_relocation_moves_block() {
        let mut doc = Section::root(KeyMode::String);
        doc.set(&route("a"), json!("v"));
        let mut relocations = IndexMap::new();
        relocations.insert(route("a"), route("b"));

        apply_fresh(&mut doc, &relocations);

        assert!(!doc.contains(&route("a")));
        assert_eq!(doc.get_as_string(&route("b")), Some("v".to_string()));
    }

    #[test]
    fn missing_source_is_skipped() {
        let mut doc = Section::root(KeyMode::String);
        let mut relocations = IndexMap::new();
        relocations.insert(route("a"), route("b"));

        apply_fresh(&mut doc, &relocations);

        assert!(!doc.contains(&route("b")));
    }

    #[test]
    fn to_left_alone_when_from_absent_but_to_present() {
        let mut doc = Section::root(KeyMode::String);
        doc.set(&route("b"), json!("existing"));
        let mut relocations = IndexMap::new();
        relocations.insert(route("a"), route("b"));

        apply_fresh(&mut doc, &relocations);

        assert_eq!(doc.get_as_string(&route("b")), Some("existing".to_string()));
    }

    #[test]
    fn both_present_overwrites_to() {
        let mut doc = Section::root(KeyMode::String);
        doc.set(&route("a"), json!("from-value"));
        doc.set(&route("b"), json!("to-value"));
        let mut relocations = IndexMap::new();
        relocations.insert(route("a"), route("b"));

        apply_fresh(&mut doc, &relocations);

        assert!(!doc.contains(&route("a")));
        assert_eq!(doc.get_as_string(&route("b")), Some("from-value".to_string()));
    }

    #[test]
    fn chained_relocation_frees_target_slot_first() {
        // a -> b, b -> c : applying "a" first must chase "b -> c" so b's slot is free.
        let mut doc = Section::root(KeyMode::String);
        doc.set(&route("a"), json!("from-a"));
        doc.set(&route("b"), json!("from-b"));
        let mut relocations = IndexMap::new();
        relocations.insert(route("a"), route("b"));
        relocations.insert(route("b"), route("c"));

        apply_fresh(&mut doc, &relocations);

        assert!(!doc.contains(&route("a")));
        assert_eq!(doc.get_as_string(&route("b")), Some("from-a".to_string()));
        assert_eq!(doc.get_as_string(&route("c")), Some("from-b".to_string()));
    }

    #[test]
    fn cyclic_relocation_terminates_without_duplication() {
        // a -> b, b -> a
        let mut doc = Section::root(KeyMode::String);
        doc.set(&route("a"), json!("from-a"));
        doc.set(&route("b"), json!("from-b"));
        let mut relocations = IndexMap::new();
        relocations.insert(route("a"), route("b"));
        relocations.insert(route("b"), route("a"));

        apply_fresh(&mut doc, &relocations);

        // one of a/b now holds the other's original value; no third key appears.
        let a = doc.get_as_string(&route("a"));
        let b = doc.get_as_string(&route("b"));
        assert!(a.is_some() && b.is_some());
        assert_ne!(a, b);
    }

    #[test]
    fn originally_present_section_emptied_by_relocation_is_left_alone() {
        // "group" holds two user-authored children, neither synthesized by any relocation; both
        // move out in the same version. Even though "group" ends up empty, it was never recorded
        // as relocation scaffolding, so it must survive, empty, rather than being pruned.
        let mut doc = Section::root(KeyMode::String);
        doc.set(&route("group.a"), json!(1));
        doc.set(&route("group.b"), json!(2));
        let mut relocations = IndexMap::new();
        relocations.insert(route("group.a"), route("top_a"));
        relocations.insert(route("group.b"), route("top_b"));

        apply_fresh(&mut doc, &relocations);

        assert!(doc.contains(&route("group")));
        assert!(doc.get_block(&route("group")).unwrap().is_section());
        assert_eq!(doc.get_as_int(&route("top_a")), Some(1));
        assert_eq!(doc.get_as_int(&route("top_b")), Some(2));
    }

    #[test]
    fn scaffold_section_created_by_an_earlier_relocation_step_is_pruned_once_drained() {
        // Version step 1 relocates "p" into a brand-new "group" section, purely as scaffolding
        // for the move. Version step 2 (a later, separate `apply` call sharing the same
        // `created_sections` set) relocates it straight back out; since "group" exists only
        // because of step 1, it must be pruned once it's empty again.
        let mut doc = Section::root(KeyMode::String);
        doc.set(&route("p"), json!("v"));
        let mut created_sections = HashSet::new();

        let mut step1 = IndexMap::new();
        step1.insert(route("p"), route("group.x"));
        apply(&mut doc, &step1, &mut created_sections);
        assert_eq!(doc.get_as_string(&route("group.x")), Some("v".to_string()));

        let mut step2 = IndexMap::new();
        step2.insert(route("group.x"), route("top"));
        apply(&mut doc, &step2, &mut created_sections);

        assert!(!doc.contains(&route("group")));
        assert_eq!(doc.get_as_string(&route("top")), Some("v".to_string()));
    }

    #[test]
    fn originally_present_empty_section_is_left_alone() {
        let mut doc = Section::root(KeyMode::String);
        doc.create_section(&route("group"));
        doc.set(&route("a"), json!("v"));
        let mut relocations = IndexMap::new();
        relocations.insert(route("a"), route("b"));

        apply_fresh(&mut doc, &relocations);

        assert!(doc.contains(&route("group")));
    }
}
