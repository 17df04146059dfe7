//! Verbosity counters and their resolution to levels.
//!
//! A verbosity is the repeat-count of a "more output" flag:
//! no flag → 0, `-v` → 1, `-vv` → 2, and so on.

pub use self::{
    filter::VerbosityLevelsFilter,
    resolver::{VerbosityLevelResolver, VerbosityRange},
};

use crate::errors::VerbosityError;

mod filter;
mod resolver;

/// A non-negative repeat-flag count.
pub type Verbosity = u64;

/// The open upper bound of the last verbosity range. Not a valid verbosity
/// itself.
pub const MAX_VERBOSITY: Verbosity = u64::MAX;

pub(crate) fn check_verbosity(verbosity: Verbosity) -> Result<Verbosity, VerbosityError> {
    if verbosity == MAX_VERBOSITY {
        Err(VerbosityError::InvalidVerbosity { verbosity })
    } else {
        Ok(verbosity)
    }
}
