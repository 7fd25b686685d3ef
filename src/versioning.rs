//! Versioning providers: how the orchestrator learns a document's and the defaults' version ids.

use crate::error::{self, Result};
use crate::route::Route;
use crate::section::Section;
use crate::version::{Version, VersionPattern};

/// Resolves the defaults' and a document's version against a [`VersionPattern`].
pub trait Versioning {
    /// Fails with [`error::Error::MissingDefaultsVersion`] if defaults lack a parseable version.
    fn defaults_version(&self, defaults: &Section) -> Result<Version>;

    /// `None` means "absent"; the orchestrator substitutes `pattern.first_version()`.
    fn document_version(&self, doc: &Section) -> Option<Version>;

    fn pattern(&self) -> &VersionPattern;
}

/// Explicit, caller-supplied version ids; no document is consulted.
pub struct ManualVersioning {
    pattern: VersionPattern,
    document_id: Option<String>,
    defaults_id: String,
}

impl ManualVersioning {
    /// `defaults_id` is required; `document_id` may be omitted, in which case
    /// [`Versioning::document_version`] returns `None`.
    pub fn new(pattern: VersionPattern, document_id: Option<String>, defaults_id: String) -> ManualVersioning {
        ManualVersioning {
            pattern,
            document_id,
            defaults_id,
        }
    }
}

impl Versioning for ManualVersioning {
    fn defaults_version(&self, _defaults: &Section) -> Result<Version> {
        self.pattern
            .parse(&self.defaults_id)
            .map_err(|_| error::Error::MissingDefaultsVersion)
    }

    fn document_version(&self, _doc: &Section) -> Option<Version> {
        let id = self.document_id.as_ref()?;
        self.pattern.parse(id).ok()
    }

    fn pattern(&self) -> &VersionPattern {
        &self.pattern
    }
}

/// Reads the version id out of the document/defaults themselves, at a configured route.
pub struct AutomaticVersioning {
    pattern: VersionPattern,
    route: Route,
}

impl AutomaticVersioning {
    pub fn new(pattern: VersionPattern, route: Route) -> AutomaticVersioning {
        AutomaticVersioning { pattern, route }
    }
}

impl Versioning for AutomaticVersioning {
    fn defaults_version(&self, defaults: &Section) -> Result<Version> {
        let id = defaults
            .get_as_string(&self.route)
            .ok_or(error::Error::MissingDefaultsVersion)?;
        self.pattern.parse(&id).map_err(|_| error::Error::MissingDefaultsVersion)
    }

    fn document_version(&self, doc: &Section) -> Option<Version> {
        let id = doc.get_as_string(&self.route)?;
        self.pattern.parse(&id).ok()
    }

    fn pattern(&self) -> &VersionPattern {
        &self.pattern
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::section::KeyMode;
    use serde_json::json;

    fn pattern() -> VersionPattern {
        VersionPattern::numeric(1, 9)
    }

    #[test]
    fn manual_versioning_uses_explicit_ids() {
        let v = ManualVersioning::new(pattern(), Some("1".to_string()), "2".to_string());
        let doc = Section::root(KeyMode::String);
        let defaults = Section::root(KeyMode::String);
        assert_eq!(v.document_version(&doc), pattern().parse("1").ok());
        assert_eq!(v.defaults_version(&defaults).unwrap(), pattern().parse("2").unwrap());
    }

    #[test]
    fn manual_versioning_document_id_optional() {
        let v = ManualVersioning::new(pattern(), None, "2".to_string());
        let doc = Section::root(KeyMode::String);
        assert_eq!(v.document_version(&doc), None);
    }

    #[test]
    fn automatic_versioning_reads_route() {
        let mut doc = Section::root(KeyMode::String);
        doc.set(&Route::from_string("version", '.'), json!("1"));
        let mut defaults = Section::root(KeyMode::String);
        defaults.set(&Route::from_string("version", '.'), json!("2"));

        let v = AutomaticVersioning::new(pattern(), Route::from_string("version", '.'));
        assert_eq!(v.document_version(&doc), pattern().parse("1").ok());
        assert_eq!(v.defaults_version(&defaults).unwrap(), pattern().parse("2").unwrap());
    }

    #[test]
    fn automatic_versioning_missing_document_route_is_none() {
        let doc = Section::root(KeyMode::String);
        let v = AutomaticVersioning::new(pattern(), Route::from_string("version", '.'));
        assert_eq!(v.document_version(&doc), None);
    }

    #[test]
    fn automatic_versioning_missing_defaults_route_fails() {
        let defaults = Section::root(KeyMode::String);
        let v = AutomaticVersioning::new(pattern(), Route::from_string("version", '.'));
        assert!(v.defaults_version(&defaults).is_err());
    }
}
