//! A verbosity-driven structured logging toolkit.
//!
//! This crate is the facade: it re-exports the engine ([`verbo_core`]),
//! both sinks ([`verbo_console`], [`verbo_json`]) and provides one-call
//! configuration through [`setup`].
//!
//! ```
//! use verbo::{info, ConsoleSpec, Manager, Setup};
//!
//! # fn main() -> Result<(), verbo::SetupError> {
//! let manager = Manager::new();
//! verbo::setup(
//!     &manager,
//!     Setup::default()
//!         .verbosity(1)
//!         .console(ConsoleSpec::Default)
//!         .assign("my_app", "app"),
//! )?;
//!
//! let logger = manager.logger("my_app.db");
//! info!(logger, "connected", host = "10.0.0.3", attempts = 2);
//! # Ok(())
//! # }
//! ```

#![warn(rust_2018_idioms, unreachable_pub)]

use std::{path::PathBuf, sync::Arc};

pub use verbo_core::{
    critical, debug, default_manager, error, event, info, level, warning, ErrorInfo, Fields,
    LevelError, LevelSetting, LevelTable, LevelValue, Logger, Manager, Record, Role, RoleError,
    SetupError, Sink, SinkCore, SinkError, Verbosity, VerbosityError, VerbosityLevelResolver,
    VerbosityLevelsFilter, DEFAULT_ROLE_LEVEL, MAX_VERBOSITY, WILDCARD_ROLE_NAME,
};

pub use verbo_console::{Colorization, ConsoleOptions, ConsoleSink, StreamKind};
pub use verbo_json::{FileOptions, FileSink};

/// What to install into the manager's console slot.
///
/// A closed set of variants instead of an "anything goes" argument: the
/// construction dispatches on the tag, and unsupported shapes don't exist.
#[derive(Default)]
pub enum ConsoleSpec {
    /// Stdout, auto colors, no own threshold.
    #[default]
    Default,
    /// Clear the slot.
    Disabled,
    /// Stdout with an explicit own threshold.
    AtLevel(LevelSetting),
    FromOptions(ConsoleOptions),
    Explicit(Arc<dyn Sink>),
}

/// What to install into the manager's file slot.
#[derive(Default)]
pub enum FileSpec {
    /// Clear the slot.
    #[default]
    Disabled,
    /// A JSON-lines [`FileSink`] with default options.
    Path(PathBuf),
    FromOptions(FileOptions),
    Explicit(Arc<dyn Sink>),
}

/// The one-call configuration consumed by [`setup`].
#[derive(Default)]
pub struct Setup {
    pub level: Option<LevelSetting>,
    pub verbosity: Option<Verbosity>,
    pub console: ConsoleSpec,
    pub file: FileSpec,
    /// `(logger name, role name)` assignments.
    pub roles: Vec<(String, String)>,
    /// Extra sinks attached to every member of a role; the
    /// [`WILDCARD_ROLE_NAME`] targets all assigned loggers.
    pub role_sinks: Vec<(String, Arc<dyn Sink>)>,
}

impl Setup {
    /// The root logger's own level.
    pub fn level(mut self, level: impl Into<LevelSetting>) -> Self {
        self.level = Some(level.into());
        self
    }

    pub fn verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = Some(verbosity);
        self
    }

    pub fn console(mut self, console: ConsoleSpec) -> Self {
        self.console = console;
        self
    }

    pub fn file(mut self, file: FileSpec) -> Self {
        self.file = file;
        self
    }

    pub fn assign(mut self, logger_name: impl Into<String>, role_name: impl Into<String>) -> Self {
        self.roles.push((logger_name.into(), role_name.into()));
        self
    }

    pub fn role_sink(mut self, role_name: impl Into<String>, sink: Arc<dyn Sink>) -> Self {
        self.role_sinks.push((role_name.into(), sink));
        self
    }
}

/// Applies a [`Setup`] to a manager: root level, role assignments,
/// verbosity, then the console and file slots, failing fast on the first
/// configuration error.
pub fn setup(manager: &Manager, setup: Setup) -> Result<(), SetupError> {
    if let Some(level) = setup.level {
        manager.root().set_level(manager.levels().resolve(level)?);
    }

    for (logger_name, role_name) in &setup.roles {
        manager.assign_role(logger_name, role_name)?;
    }

    if let Some(verbosity) = setup.verbosity {
        manager.set_verbosity(verbosity)?;
    }

    match setup.console {
        ConsoleSpec::Default => {
            manager.set_console_sink(Some(Arc::new(ConsoleSink::new())));
        }
        ConsoleSpec::Disabled => manager.set_console_sink(None),
        ConsoleSpec::AtLevel(level) => {
            let sink = ConsoleSink::at_level(manager.levels(), level)?;
            manager.set_console_sink(Some(Arc::new(sink)));
        }
        ConsoleSpec::FromOptions(options) => {
            let sink = ConsoleSink::from_options(manager.levels(), options)?;
            manager.set_console_sink(Some(Arc::new(sink)));
        }
        ConsoleSpec::Explicit(sink) => manager.set_console_sink(Some(sink)),
    }

    match setup.file {
        FileSpec::Disabled => manager.set_file_sink(None),
        FileSpec::Path(path) => {
            let sink = FileSink::from_options(manager.levels(), FileOptions::new(path))?;
            manager.set_file_sink(Some(Arc::new(sink)));
        }
        FileSpec::FromOptions(options) => {
            let sink = FileSink::from_options(manager.levels(), options)?;
            manager.set_file_sink(Some(Arc::new(sink)));
        }
        FileSpec::Explicit(sink) => manager.set_file_sink(Some(sink)),
    }

    for (role_name, sink) in setup.role_sinks {
        manager.add_sink(sink, &role_name);
    }

    Ok(())
}
