//! The orchestrator tying relocation, value-mapping, custom mutation, and merge into one pipeline.

use std::collections::HashSet;

use log::{debug, info};

use crate::error::{self, Result};
use crate::mapper;
use crate::merger;
use crate::relocator;
use crate::mutator;
use crate::section::Section;
use crate::settings::UpdaterSettings;
use crate::version::Version;

/// Runs the full update pipeline against `user`, in place, per §4.K.
///
/// With no versioning configured, steps 2-5 (version resolution, relocate, map, mutate) are
/// skipped entirely and only the merge runs, against an empty per-version ignore set.
pub fn update(user: &mut Section, defaults: &Section, settings: &mut UpdaterSettings) -> Result<()> {
    let merge_version_id = match resolve_versions(user, defaults, settings)? {
        None => String::new(),
        Some((docv, defv, sep, downgrade_skipped)) => {
            run_version_steps(user, settings, &docv, &defv, sep)?;
            let effective = if downgrade_skipped { &docv } else { &defv };
            format_version(settings, effective)
        }
    };

    let sep = settings
        .versioning()
        .map(|v| v.pattern().separator())
        .unwrap_or('.');
    let ignored = settings.ignored_routes_for(&merge_version_id, sep);
    debug!("Merging with ignore set of {} routes", ignored.len());
    merger::merge(user, defaults, &ignored, settings.merge_options());

    settings.run_save_hook(user);
    info!("Update complete");
    Ok(())
}

fn format_version(settings: &UpdaterSettings, v: &Version) -> String {
    settings
        .versioning()
        .map(|versioning| versioning.pattern().format(v))
        .unwrap_or_default()
}

/// Resolves `(docVersion, defaultsVersion, separator, downgrade_was_skipped)`, or `None` if no
/// versioning is configured at all.
fn resolve_versions(
    user: &Section,
    defaults: &Section,
    settings: &UpdaterSettings,
) -> Result<Option<(Version, Version, char, bool)>> {
    let Some(versioning) = settings.versioning() else {
        return Ok(None);
    };
    let pattern = versioning.pattern();
    let defv = versioning.defaults_version(defaults)?;
    let docv = versioning.document_version(user).unwrap_or_else(|| pattern.first_version());

    if docv > defv {
        if settings.enable_downgrading() {
            debug!("Document version is newer than defaults; downgrading, skipping relocate/map/mutate");
            return Ok(Some((docv, defv, pattern.separator(), true)));
        }
        return error::DowngradeRefusedSnafu.fail();
    }

    Ok(Some((docv, defv, pattern.separator(), false)))
}

fn run_version_steps(
    user: &mut Section,
    settings: &mut UpdaterSettings,
    docv: &Version,
    defv: &Version,
    sep: char,
) -> Result<()> {
    let pattern = settings.versioning().expect("checked by caller").pattern().clone();
    // Shared across every version step so a section scaffolded by a relocation at one version,
    // but not drained until a later one, is still recognized as prunable then.
    let mut created_sections: HashSet<crate::route::Route> = HashSet::new();
    for v in pattern.range(docv, defv) {
        let version_id = pattern.format(&v);
        debug!("Running version step {}", version_id);

        let relocations = settings.relocations_for(&version_id, sep);
        if !relocations.is_empty() {
            relocator::apply(user, &relocations, &mut created_sections);
        }

        let mappers = settings.mappers_for(&version_id, sep);
        if !mappers.is_empty() {
            mapper::apply(user, mappers.iter().map(|(r, m)| (r, *m)))?;
        }

        let mutators = settings.mutators_for_mut(&version_id);
        if !mutators.is_empty() {
            mutator::apply(user, &version_id, mutators)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::route::Route;
    use crate::section::KeyMode;
    use crate::version::VersionPattern;
    use crate::versioning::ManualVersioning;
    use serde_json::json;

    fn route(s: &str) -> Route {
        Route::from_string(s, '.')
    }

    fn section_from(pairs: &[(&str, serde_json::Value)]) -> Section {
        let mut s = Section::root(KeyMode::String);
        for (k, v) in pairs {
            s.set(&route(k), v.clone());
        }
        s
    }

    #[test]
    fn scenario_1_merge_preserves_user_scalar() {
        let defaults = section_from(&[("greeting", json!("hello"))]);
        let mut user = section_from(&[("greeting", json!("hi"))]);
        let mut settings = UpdaterSettings::builder().build();

        update(&mut user, &defaults, &mut settings).unwrap();

        assert_eq!(user.get_as_string(&route("greeting")), Some("hi".to_string()));
    }

    #[test]
    fn scenario_2_merge_adds_missing_default() {
        let defaults = section_from(&[("a", json!(1)), ("b", json!(2))]);
        let mut user = section_from(&[("a", json!(10))]);
        let mut settings = UpdaterSettings::builder().build();

        update(&mut user, &defaults, &mut settings).unwrap();

        let keys: Vec<String> = user.keys().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn scenario_3_delete_user_only_unless_keep_all() {
        let defaults = section_from(&[("a", json!(1))]);
        let mut user = section_from(&[("a", json!(1)), ("extra", json!("x"))]);
        let mut settings = UpdaterSettings::builder().keep_all(true).build();

        update(&mut user, &defaults, &mut settings).unwrap();

        assert!(user.contains(&route("extra")));
    }

    #[test]
    fn scenario_4_type_mismatch_section_at_mapping() {
        let mut defaults = Section::root(KeyMode::String);
        defaults.set(&route("k.inner"), json!(1));
        let mut user = Section::root(KeyMode::String);
        user.set(&route("k"), json!("scalar"));

        let mut settings = UpdaterSettings::builder()
            .merge_rule(crate::merger::MergeClassification::SectionAtMapping, false)
            .build();

        update(&mut user, &defaults, &mut settings).unwrap();

        assert!(user.get_block(&route("k")).unwrap().is_section());
        assert_eq!(user.get_as_int(&route("k.inner")), Some(1));
    }

    #[test]
    fn scenario_5_relocation_then_merge() {
        let defaults = section_from(&[("b", json!("v"))]);
        let mut user = section_from(&[("a", json!("v"))]);

        let pattern = VersionPattern::numeric(1, 9);
        let mut settings = UpdaterSettings::builder()
            .versioning(ManualVersioning::new(pattern, Some("1".to_string()), "2".to_string()))
            .relocate("2", route("a"), route("b"))
            .build();

        update(&mut user, &defaults, &mut settings).unwrap();

        assert!(!user.contains(&route("a")));
        assert_eq!(user.get_as_string(&route("b")), Some("v".to_string()));
    }

    #[test]
    fn scenario_6_value_mapper_transforms_type_across_version() {
        let defaults = section_from(&[("mode", json!("ON"))]);
        let mut user = section_from(&[("mode", json!(true))]);

        let pattern = VersionPattern::numeric(1, 9);
        let mut settings = UpdaterSettings::builder()
            .versioning(ManualVersioning::new(pattern, Some("1".to_string()), "2".to_string()))
            .map_value(
                "2",
                route("mode"),
                crate::mapper::ValueMapper::from_value(|v| {
                    Ok(json!(if v.as_bool() == Some(true) { "ON" } else { "OFF" }))
                }),
            )
            .merge_rule(crate::merger::MergeClassification::Mappings, true)
            .build();

        update(&mut user, &defaults, &mut settings).unwrap();

        assert_eq!(user.get_as_string(&route("mode")), Some("ON".to_string()));
    }

    #[test]
    fn boundary_no_versioning_skips_relocate_map_mutate_but_still_merges() {
        let defaults = section_from(&[("a", json!(1))]);
        let mut user = section_from(&[("a", json!(2))]);
        let mut settings = UpdaterSettings::builder().build();

        update(&mut user, &defaults, &mut settings).unwrap();

        assert_eq!(user.get_as_int(&route("a")), Some(2));
    }

    #[test]
    fn boundary_doc_version_equals_defaults_version_runs_no_version_steps() {
        let defaults = section_from(&[("a", json!(1))]);
        let mut user = section_from(&[("a", json!(1))]);
        let pattern = VersionPattern::numeric(1, 9);
        let mut settings = UpdaterSettings::builder()
            .versioning(ManualVersioning::new(pattern, Some("3".to_string()), "3".to_string()))
            .build();

        update(&mut user, &defaults, &mut settings).unwrap();

        assert_eq!(user.get_as_int(&route("a")), Some(1));
    }

    #[test]
    fn boundary_downgrade_refused_without_flag() {
        let defaults = section_from(&[("a", json!(1))]);
        let mut user = section_from(&[("a", json!(1))]);
        let pattern = VersionPattern::numeric(1, 9);
        let mut settings = UpdaterSettings::builder()
            .enable_downgrading(false)
            .versioning(ManualVersioning::new(pattern, Some("5".to_string()), "1".to_string()))
            .build();

        let err = update(&mut user, &defaults, &mut settings).unwrap_err();
        assert!(matches!(err, error::Error::DowngradeRefused));
    }

    #[test]
    fn boundary_downgrade_allowed_skips_to_merge() {
        let defaults = section_from(&[("a", json!(1))]);
        let mut user = section_from(&[("a", json!(2))]);
        let pattern = VersionPattern::numeric(1, 9);
        let mut settings = UpdaterSettings::builder()
            .versioning(ManualVersioning::new(pattern, Some("5".to_string()), "1".to_string()))
            .build();

        update(&mut user, &defaults, &mut settings).unwrap();

        assert_eq!(user.get_as_int(&route("a")), Some(2));
    }
}
