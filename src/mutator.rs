//! Applies per-version custom mutators to a document in place.

use log::trace;

use crate::error::{self, Result};
use crate::mapper::MapperResult;
use crate::section::Section;

/// A user-supplied callback that arbitrarily restructures the document at one version step.
/// `FnMut` because mutators commonly accumulate state (e.g. counting how many entries they
/// touched) across their single invocation -- this crate never calls one twice.
pub type Mutator = Box<dyn FnMut(&mut Section) -> MapperResult<()> + Send + Sync>;

/// Runs every mutator in `mutators`, in registration order, against `doc`, for one version step.
/// Mutators run last within a version step, after relocation and value-mapper application.
pub fn apply(doc: &mut Section, version: &str, mutators: &mut [Mutator]) -> Result<()> {
    for (i, mutator) in mutators.iter_mut().enumerate() {
        trace!("Running mutator {} at version {}", i, version);
        mutator(doc).map_err(|source| error::Error::MutatorException {
            version: version.to_string(),
            source,
        })?;
    }
    Ok(())
}
