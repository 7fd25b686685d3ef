use snafu::Snafu;

/// The closed set of errors this crate can produce; see the error-surface taxonomy.
///
/// `VersionMalformed`, `MissingDefaultsVersion`, and `DowngradeRefused` are fatal to a whole
/// [`crate::updater::update`] call. `RouteTooShort`, `KeyModeMismatch`, and `NonStringKey` are
/// fatal only to the call that produced them. `MapperException` and `MutatorException` wrap
/// whatever error a caller's closure returned, unchanged, and abort the pipeline.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("Version id '{id}' does not match pattern {pattern_desc}"))]
    VersionMalformed { id: String, pattern_desc: String },

    #[snafu(display("Defaults document has no valid version at the configured route"))]
    MissingDefaultsVersion,

    #[snafu(display(
        "Document version is newer than defaults version and downgrading is disabled"
    ))]
    DowngradeRefused,

    #[snafu(display("Route of length {length} has no parent"))]
    RouteTooShort { length: usize },

    #[snafu(display("String-keyed route operation used while section is in object key mode"))]
    KeyModeMismatch,

    #[snafu(display("Route.join(sep) called on a route containing a non-string key"))]
    NonStringKey,

    #[snafu(display("Value mapper at route '{route}' failed: {source}"))]
    MapperException {
        route: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[snafu(display("Custom mutator failed at version {version}: {source}"))]
    MutatorException {
        version: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
