//! [`UpdaterSettings`]: a typed, immutable configuration snapshot built via a fluent builder.

use std::collections::HashMap;

use crate::mapper::ValueMapper;
use crate::merger::{MergeClassification, MergeOptions, MergeRules, OptionSorting};
use crate::mutator::Mutator;
use crate::route::Route;
use crate::route_map::{RouteMap, RouteSet};
use crate::versioning::Versioning;

type PerVersion<V> = HashMap<String, V>;

/// Immutable configuration for one [`crate::updater::update`] call.
///
/// Built via [`UpdaterSettingsBuilder`]; per-version maps (ignored routes, relocations, mappers,
/// custom mutators) accumulate across builder calls for the same version rather than replacing.
pub struct UpdaterSettings {
    pub(crate) auto_save: bool,
    pub(crate) enable_downgrading: bool,
    pub(crate) merge_options: MergeOptions,
    pub(crate) versioning: Option<Box<dyn Versioning>>,
    pub(crate) ignored_routes: PerVersion<RouteSet>,
    pub(crate) relocations: PerVersion<RouteMap<Route>>,
    pub(crate) mappers: PerVersion<RouteMap<ValueMapper>>,
    pub(crate) mutators: PerVersion<Vec<Mutator>>,
    pub(crate) save_hook: Option<Box<dyn FnMut(&crate::section::Section) + Send + Sync>>,
}

impl UpdaterSettings {
    pub fn builder() -> UpdaterSettingsBuilder {
        UpdaterSettingsBuilder::new()
    }

    pub fn auto_save(&self) -> bool {
        self.auto_save
    }

    pub fn enable_downgrading(&self) -> bool {
        self.enable_downgrading
    }

    pub fn merge_options(&self) -> &MergeOptions {
        &self.merge_options
    }

    pub fn versioning(&self) -> Option<&dyn Versioning> {
        self.versioning.as_deref()
    }

    pub(crate) fn ignored_routes_for(&self, version: &str, sep: char) -> std::collections::HashSet<Route> {
        self.ignored_routes
            .get(version)
            .map(|s| s.merge(sep).into_iter().collect())
            .unwrap_or_default()
    }

    pub(crate) fn relocations_for(&self, version: &str, sep: char) -> indexmap::IndexMap<Route, Route> {
        self.relocations
            .get(version)
            .map(|m| m.merge(sep))
            .unwrap_or_default()
    }

    pub(crate) fn mappers_for(&self, version: &str, sep: char) -> indexmap::IndexMap<Route, &ValueMapper> {
        self.mappers
            .get(version)
            .map(|m| m.merge_ref(sep))
            .unwrap_or_default()
    }

    pub(crate) fn mutators_for_mut(&mut self, version: &str) -> &mut [Mutator] {
        self.mutators.get_mut(version).map(Vec::as_mut_slice).unwrap_or(&mut [])
    }

    pub(crate) fn run_save_hook(&mut self, doc: &crate::section::Section) {
        if self.auto_save {
            if let Some(hook) = &mut self.save_hook {
                hook(doc);
            }
        }
    }
}

/// Builds an [`UpdaterSettings`]. Mirrors §4.L's defaults: auto-save and downgrading enabled,
/// keep-all disabled, SORT_BY_DEFAULTS, `{MAPPINGS: true, MAPPING_AT_SECTION: false,
/// SECTION_AT_MAPPING: false}`, no versioning.
pub struct UpdaterSettingsBuilder {
    auto_save: bool,
    enable_downgrading: bool,
    keep_all: bool,
    option_sorting: OptionSorting,
    merge_rules: MergeRules,
    versioning: Option<Box<dyn Versioning>>,
    ignored_routes: PerVersion<RouteSet>,
    relocations: PerVersion<RouteMap<Route>>,
    mappers: PerVersion<RouteMap<ValueMapper>>,
    mutators: PerVersion<Vec<Mutator>>,
    save_hook: Option<Box<dyn FnMut(&crate::section::Section) + Send + Sync>>,
}

impl UpdaterSettingsBuilder {
    pub fn new() -> UpdaterSettingsBuilder {
        UpdaterSettingsBuilder {
            auto_save: true,
            enable_downgrading: true,
            keep_all: false,
            option_sorting: OptionSorting::SortByDefaults,
            merge_rules: MergeRules::default(),
            versioning: None,
            ignored_routes: HashMap::new(),
            relocations: HashMap::new(),
            mappers: HashMap::new(),
            mutators: HashMap::new(),
            save_hook: None,
        }
    }

    pub fn auto_save(mut self, auto_save: bool) -> Self {
        self.auto_save = auto_save;
        self
    }

    pub fn enable_downgrading(mut self, enable: bool) -> Self {
        self.enable_downgrading = enable;
        self
    }

    pub fn keep_all(mut self, keep_all: bool) -> Self {
        self.keep_all = keep_all;
        self
    }

    pub fn option_sorting(mut self, sorting: OptionSorting) -> Self {
        self.option_sorting = sorting;
        self
    }

    pub fn merge_rule(mut self, classification: MergeClassification, preserve_user: bool) -> Self {
        self.merge_rules.set(classification, preserve_user);
        self
    }

    pub fn versioning(mut self, versioning: impl Versioning + 'static) -> Self {
        self.versioning = Some(Box::new(versioning));
        self
    }

    pub fn on_save(mut self, hook: impl FnMut(&crate::section::Section) + Send + Sync + 'static) -> Self {
        self.save_hook = Some(Box::new(hook));
        self
    }

    pub fn ignore_route(mut self, version: impl Into<String>, route: Route) -> Self {
        self.ignored_routes.entry(version.into()).or_default().insert_route(route);
        self
    }

    pub fn ignore_route_string(mut self, version: impl Into<String>, route: impl Into<String>) -> Self {
        self.ignored_routes
            .entry(version.into())
            .or_default()
            .insert_string(route);
        self
    }

    pub fn relocate(mut self, version: impl Into<String>, from: Route, to: Route) -> Self {
        self.relocations.entry(version.into()).or_default().insert_route(from, to);
        self
    }

    pub fn relocate_strings(mut self, version: impl Into<String>, from: impl Into<String>, to: Route) -> Self {
        self.relocations
            .entry(version.into())
            .or_default()
            .insert_string(from, to);
        self
    }

    pub fn map_value(mut self, version: impl Into<String>, route: Route, mapper: ValueMapper) -> Self {
        self.mappers.entry(version.into()).or_default().insert_route(route, mapper);
        self
    }

    pub fn mutate(mut self, version: impl Into<String>, mutator: Mutator) -> Self {
        self.mutators.entry(version.into()).or_default().push(mutator);
        self
    }

    pub fn build(self) -> UpdaterSettings {
        UpdaterSettings {
            auto_save: self.auto_save,
            enable_downgrading: self.enable_downgrading,
            merge_options: MergeOptions {
                keep_all: self.keep_all,
                option_sorting: self.option_sorting,
                merge_rules: self.merge_rules,
            },
            versioning: self.versioning,
            ignored_routes: self.ignored_routes,
            relocations: self.relocations,
            mappers: self.mappers,
            mutators: self.mutators,
            save_hook: self.save_hook,
        }
    }
}

impl Default for UpdaterSettingsBuilder {
    fn default() -> Self {
        UpdaterSettingsBuilder::new()
    }
}
