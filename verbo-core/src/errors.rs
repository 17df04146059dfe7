use std::fmt::{self, Display};

use derive_more::{Display, Error, From};

use crate::{level::LevelValue, verbosity::Verbosity};

/// Errors of loose level resolution, see [`LevelTable::resolve`].
///
/// [`LevelTable::resolve`]: crate::LevelTable::resolve
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LevelError {
    /// The integer is not a member of the level table.
    UnknownLevel {
        value: LevelValue,
        known: Vec<(LevelValue, String)>,
    },
    /// The string is neither a digit-string nor a known level name.
    UnknownLevelName { name: String, known: Vec<String> },
}

impl Display for LevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownLevel { value, known } => {
                write!(f, "unknown level {value}, known levels are ")?;
                for (i, (value, name)) in known.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{value} ({name})")?;
                }
                Ok(())
            }
            Self::UnknownLevelName { name, known } => {
                write!(f, "unknown level name {name:?}, known names are ")?;
                for (i, name) in known.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name}")?;
                }
                Ok(())
            }
        }
    }
}

/// Errors of verbosity validation and resolver construction.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error, From)]
pub enum VerbosityError {
    /// The verbosity reached the open-upper-bound sentinel.
    #[display("invalid verbosity {verbosity}, must be below the maximum sentinel")]
    InvalidVerbosity { verbosity: Verbosity },
    /// Two entries of one verbosity-level list share a verbosity. Which one
    /// would win is a sort-stability accident, so it is rejected outright.
    #[display("duplicate verbosity {verbosity} in the level list")]
    DuplicateVerbosity { verbosity: Verbosity },
    /// A level of the list failed to resolve.
    #[display("{_0}")]
    #[from]
    InvalidLevel(LevelError),
}

/// Errors of role construction, CRUD and assignment.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error, From)]
pub enum RoleError {
    /// Role names must be non-empty and distinct from the `"*"` wildcard.
    #[display("role name can not be empty or the {:?} wildcard", crate::role::WILDCARD_ROLE_NAME)]
    InvalidName,
    /// A role with this name is already registered.
    #[display("role {name:?} already exists")]
    DuplicateRole { name: String },
    /// No role with this name is registered.
    #[display("no role named {name:?}")]
    UnknownRole { name: String },
    /// Built-in roles can not be deleted.
    #[display("role {name:?} is built-in and can not be deleted")]
    BuiltinRole { name: String },
    /// The logger is already assigned to a different role. Clear the
    /// current assignment explicitly first.
    #[display("logger {logger:?} is already assigned role {current:?}")]
    AlreadyAssigned { logger: String, current: String },
    /// The role's verbosity-level table failed to compile.
    #[display("{_0}")]
    #[from]
    InvalidLevels(VerbosityError),
}

/// Errors surfaced while applying a sink or setup configuration.
#[derive(Debug, Display, Error, From)]
pub enum SetupError {
    #[display("{_0}")]
    Level(LevelError),
    #[display("{_0}")]
    Verbosity(VerbosityError),
    #[display("{_0}")]
    Role(RoleError),
    #[display("cannot open the sink output: {_0}")]
    Io(std::io::Error),
}
