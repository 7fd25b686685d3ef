//! Structure-preserving merge of a user document against a defaults document.

use std::collections::HashSet;

use crate::block::Block;
use crate::route::{Key, Route};
use crate::section::Section;

/// Whether the merged result's key order follows the user document or the defaults document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionSorting {
    None,
    SortByDefaults,
}

impl Default for OptionSorting {
    fn default() -> Self {
        OptionSorting::SortByDefaults
    }
}

/// Which of the two non-recursing mismatch classifications a merge rule governs.
///
/// Classified by `(userIsSection, defaultsIsSection)`; the `(true, true)` pair always recurses
/// and the `(false, false)` pair is [`MergeClassification::Mappings`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MergeClassification {
    /// Both blocks are plain entries.
    Mappings,
    /// The user document holds a section where defaults hold a plain entry.
    MappingAtSection,
    /// The user document holds a plain entry where defaults hold a section.
    SectionAtMapping,
}

/// Per-classification "preserve the user block" flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeRules {
    mappings: bool,
    mapping_at_section: bool,
    section_at_mapping: bool,
}

impl Default for MergeRules {
    fn default() -> Self {
        MergeRules {
            mappings: true,
            mapping_at_section: false,
            section_at_mapping: false,
        }
    }
}

impl MergeRules {
    pub fn new(mappings: bool, mapping_at_section: bool, section_at_mapping: bool) -> MergeRules {
        MergeRules {
            mappings,
            mapping_at_section,
            section_at_mapping,
        }
    }

    pub fn preserve_user(&self, classification: MergeClassification) -> bool {
        match classification {
            MergeClassification::Mappings => self.mappings,
            MergeClassification::MappingAtSection => self.mapping_at_section,
            MergeClassification::SectionAtMapping => self.section_at_mapping,
        }
    }

    pub fn set(&mut self, classification: MergeClassification, preserve_user: bool) {
        match classification {
            MergeClassification::Mappings => self.mappings = preserve_user,
            MergeClassification::MappingAtSection => self.mapping_at_section = preserve_user,
            MergeClassification::SectionAtMapping => self.section_at_mapping = preserve_user,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergeOptions {
    pub keep_all: bool,
    pub option_sorting: OptionSorting,
    pub merge_rules: MergeRules,
}

impl Default for MergeOptions {
    fn default() -> Self {
        MergeOptions {
            keep_all: false,
            option_sorting: OptionSorting::default(),
            merge_rules: MergeRules::default(),
        }
    }
}

/// Merges `defaults` into `user` in place. `ignored` holds the absolute routes (already resolved
/// against the user document's current version) whose subtrees are left untouched entirely.
pub fn merge(user: &mut Section, defaults: &Section, ignored: &HashSet<Route>, options: &MergeOptions) {
    merge_at(user, defaults, None, ignored, options);
}

fn child_route(prefix: Option<&Route>, key: &Key) -> Route {
    match prefix {
        Some(p) => p.add(key.clone()),
        None => Route::from_single_key(key.clone()),
    }
}

fn merge_at(
    user: &mut Section,
    defaults: &Section,
    prefix: Option<&Route>,
    ignored: &HashSet<Route>,
    options: &MergeOptions,
) {
    let mut leftover: Vec<Key> = user.keys().cloned().collect();

    for (key, def_block) in defaults.entries() {
        leftover.retain(|k| k != key);

        let route = child_route(prefix, key);
        if ignored.contains(&route) {
            continue;
        }

        match user.direct_child(key).cloned() {
            None => user.set_direct_child(key.clone(), def_block.deep_clone()),
            Some(user_block) => {
                match (user_block.is_section(), def_block.is_section()) {
                    (true, true) => {
                        let mut user_sub = user_block.into_section().expect("checked is_section");
                        let def_sub = def_block.as_section().expect("checked is_section");
                        merge_at(&mut user_sub, def_sub, Some(&route), ignored, options);
                        user.set_direct_child(key.clone(), Block::Section(user_sub));
                    }
                    (false, false) => {
                        if !options.merge_rules.preserve_user(MergeClassification::Mappings) {
                            user.set_direct_child(key.clone(), def_block.deep_clone());
                        }
                    }
                    (true, false) => {
                        if !options.merge_rules.preserve_user(MergeClassification::MappingAtSection) {
                            user.set_direct_child(key.clone(), def_block.deep_clone());
                        }
                    }
                    (false, true) => {
                        if !options.merge_rules.preserve_user(MergeClassification::SectionAtMapping) {
                            user.set_direct_child(key.clone(), def_block.deep_clone());
                        }
                    }
                }
            }
        }
    }

    for key in &leftover {
        let route = child_route(prefix, key);
        if ignored.contains(&route) {
            continue;
        }
        if !(options.keep_all || user.is_force_keep(key)) {
            user.remove_direct_child(key);
        }
    }

    if options.option_sorting == OptionSorting::SortByDefaults {
        let defaults_order: Vec<Key> = defaults.keys().cloned().collect();
        user.reorder_children(&defaults_order);
    }
}
