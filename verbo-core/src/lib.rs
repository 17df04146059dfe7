//! Core of the `verbo` logging toolkit: canonical levels, verbosity
//! resolution, roles, the manager and priority-aware record dispatch.
//!
//! Sinks (console, JSON file) live in their own crates; this one defines
//! the [`Sink`] trait they implement and everything that decides whether a
//! record reaches them.

#![warn(rust_2018_idioms, unreachable_pub)]

pub use crate::{
    errors::{LevelError, RoleError, SetupError, VerbosityError},
    level::{LevelSetting, LevelTable, LevelValue},
    logger::Logger,
    manager::{default_manager, Manager},
    record::{ErrorInfo, Fields, Record},
    role::{Role, DEFAULT_ROLE_LEVEL, WILDCARD_ROLE_NAME},
    sink::{Sink, SinkCore, SinkError},
    verbosity::{
        Verbosity, VerbosityLevelResolver, VerbosityLevelsFilter, VerbosityRange, MAX_VERBOSITY,
    },
};

pub mod level;

mod dispatch;
mod errors;
mod logger;
mod macros;
mod manager;
mod record;
mod role;
mod sink;
mod stats;
mod verbosity;

// Used by the emission macros.
#[doc(hidden)]
pub mod _priv {
    use serde_json::Value;

    pub fn field_value<T: serde::Serialize>(value: &T) -> Value {
        serde_json::to_value(value)
            .unwrap_or_else(|_| Value::String("<unserializable>".to_owned()))
    }
}
