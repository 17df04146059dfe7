//! The manager: level table, role registry, verbosity state and the
//! logger factory.

use std::{
    cell::RefCell,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
};

use dashmap::DashMap;
use fxhash::{FxBuildHasher, FxHashMap};
use once_cell::sync::{Lazy, OnceCell};
use parking_lot::{Mutex, ReentrantMutex};

use crate::{
    dispatch::StderrSink,
    errors::{RoleError, VerbosityError},
    level::{LevelSetting, LevelTable, WARNING},
    logger::Logger,
    role::{builtin_roles, Role, WILDCARD_ROLE_NAME},
    sink::Sink,
    verbosity::{check_verbosity, Verbosity, MAX_VERBOSITY},
};

/// The state a manager shares with every logger it created.
pub(crate) struct Shared {
    levels: LevelTable,
    /// `MAX_VERBOSITY` encodes "unset" so filters can read the current
    /// verbosity with a single atomic load.
    verbosity: AtomicU64,
    loggers: DashMap<Arc<str>, Arc<Logger>, FxBuildHasher>,
    root: OnceCell<Arc<Logger>>,
    last_resort: Mutex<Option<Arc<dyn Sink>>>,
    warn_on_no_sinks: AtomicBool,
    warned_no_sinks: AtomicBool,
    /// Role registry and membership. Re-entrant: assignment is reachable
    /// from setup paths that already hold the lock. Every public entry
    /// point borrows the cell exactly once.
    state: ReentrantMutex<RefCell<State>>,
}

struct State {
    roles: FxHashMap<String, Arc<Role>>,
    members: FxHashMap<String, FxHashMap<Arc<str>, Arc<Logger>>>,
}

impl Shared {
    pub(crate) fn levels(&self) -> &LevelTable {
        &self.levels
    }

    pub(crate) fn verbosity(&self) -> Option<Verbosity> {
        let verbosity = self.verbosity.load(Ordering::Relaxed);
        (verbosity != MAX_VERBOSITY).then_some(verbosity)
    }

    pub(crate) fn last_resort(&self) -> Option<Arc<dyn Sink>> {
        self.last_resort.lock().clone()
    }

    /// True at most once per manager, and only while enabled.
    pub(crate) fn should_warn_no_sinks(&self) -> bool {
        self.warn_on_no_sinks.load(Ordering::Relaxed)
            && !self.warned_no_sinks.swap(true, Ordering::Relaxed)
    }

    fn root(&self) -> &Arc<Logger> {
        self.root.get().expect("set at construction")
    }
}

/// The process aggregate of the toolkit: owns the level table, the role
/// registry, the current verbosity and the logger registry.
///
/// Construct one per process (or per test) and hand loggers out through
/// [`Manager::logger`]; [`default_manager`] provides a lazily-created
/// process-wide instance for applications that don't care to wire one
/// through.
#[derive(Clone)]
pub struct Manager {
    shared: Arc<Shared>,
}

impl Default for Manager {
    fn default() -> Self {
        Self::new()
    }
}

impl Manager {
    pub fn new() -> Self {
        let levels = LevelTable::default();
        let roles = builtin_roles(&levels)
            .into_iter()
            .map(|role| (role.name().to_owned(), Arc::new(role)))
            .collect();

        let shared = Arc::new(Shared {
            levels,
            verbosity: AtomicU64::new(MAX_VERBOSITY),
            loggers: DashMap::default(),
            root: OnceCell::new(),
            last_resort: Mutex::new(Some(Arc::new(StderrSink::new(WARNING)))),
            warn_on_no_sinks: AtomicBool::new(true),
            warned_no_sinks: AtomicBool::new(false),
            state: ReentrantMutex::new(RefCell::new(State {
                roles,
                members: FxHashMap::default(),
            })),
        });

        let root = Arc::new(Logger::with_level(
            Arc::from(""),
            None,
            shared.clone(),
            WARNING,
        ));
        shared
            .root
            .set(root)
            .unwrap_or_else(|_| unreachable!("the root logger is set exactly once"));

        Self { shared }
    }

    /// The level table, for resolving settings and registering custom
    /// levels.
    pub fn levels(&self) -> &LevelTable {
        self.shared.levels()
    }

    /// The root logger. Its named sink slots are what the manager-level
    /// console/file operations act on.
    pub fn root(&self) -> &Arc<Logger> {
        self.shared.root()
    }

    /// Returns the logger with this name, creating it and any missing
    /// ancestors on first use. The empty name designates the root.
    pub fn logger(&self, name: &str) -> Arc<Logger> {
        if name.is_empty() {
            return self.root().clone();
        }
        if let Some(found) = self.shared.loggers.get(name) {
            return found.clone();
        }

        let parent = match name.rfind('.') {
            Some(idx) => self.logger(&name[..idx]),
            None => self.root().clone(),
        };

        let key: Arc<str> = Arc::from(name);
        self.shared
            .loggers
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Logger::new(key, Some(parent), self.shared.clone())))
            .clone()
    }

    // === Verbosity ===

    pub fn verbosity(&self) -> Option<Verbosity> {
        self.shared.verbosity()
    }

    /// Sets the process-wide verbosity and re-levels every role member.
    /// Setting the already-current value is a no-op.
    pub fn set_verbosity(&self, verbosity: Verbosity) -> Result<(), VerbosityError> {
        check_verbosity(verbosity)?;

        let guard = self.shared.state.lock();
        let state = guard.borrow();

        if self.shared.verbosity() == Some(verbosity) {
            return Ok(());
        }
        self.shared.verbosity.store(verbosity, Ordering::Relaxed);

        // A full re-scan, not incremental: roles are few and verbosity
        // changes are rare.
        for (role_name, members) in &state.members {
            let Some(role) = state.roles.get(role_name) else {
                continue;
            };
            let level = role.get_level(Some(verbosity));
            for logger in members.values() {
                logger.set_level(level);
            }
        }

        Ok(())
    }

    /// Unsets the verbosity and resets every role member to its role's
    /// default level.
    pub fn clear_verbosity(&self) {
        let guard = self.shared.state.lock();
        let state = guard.borrow();

        if self.shared.verbosity().is_none() {
            return;
        }
        self.shared.verbosity.store(MAX_VERBOSITY, Ordering::Relaxed);

        for (role_name, members) in &state.members {
            let Some(role) = state.roles.get(role_name) else {
                continue;
            };
            for logger in members.values() {
                logger.set_level(role.default_level());
            }
        }
    }

    // === Role CRUD ===

    pub fn create_role(
        &self,
        name: impl Into<String>,
        verbosity_levels: impl IntoIterator<Item = (Verbosity, LevelSetting)>,
        default_level: impl Into<LevelSetting>,
        description: Option<String>,
    ) -> Result<Arc<Role>, RoleError> {
        let role = Role::new(
            &self.shared.levels,
            name,
            verbosity_levels,
            default_level,
            description,
        )?;

        let guard = self.shared.state.lock();
        let mut state = guard.borrow_mut();

        if state.roles.contains_key(role.name()) {
            return Err(RoleError::DuplicateRole {
                name: role.name().to_owned(),
            });
        }

        let role = Arc::new(role);
        state.roles.insert(role.name().to_owned(), role.clone());
        Ok(role)
    }

    /// Deletes a user-defined role. Built-in roles stay. Memberships of a
    /// deleted role are kept: re-creating the role picks them back up.
    pub fn delete_role(&self, name: &str) -> Result<(), RoleError> {
        let guard = self.shared.state.lock();
        let mut state = guard.borrow_mut();

        match state.roles.get(name) {
            None => {
                return Err(RoleError::UnknownRole {
                    name: name.to_owned(),
                })
            }
            Some(role) if role.is_builtin() => {
                return Err(RoleError::BuiltinRole {
                    name: name.to_owned(),
                })
            }
            Some(_) => {}
        }

        state.roles.remove(name);
        Ok(())
    }

    pub fn has_role(&self, name: &str) -> bool {
        self.shared.state.lock().borrow().roles.contains_key(name)
    }

    pub fn role(&self, name: &str) -> Option<Arc<Role>> {
        self.shared.state.lock().borrow().roles.get(name).cloned()
    }

    /// A snapshot of all registered roles, sorted by name.
    pub fn roles(&self) -> Vec<Arc<Role>> {
        let guard = self.shared.state.lock();
        let state = guard.borrow();
        let mut roles: Vec<_> = state.roles.values().cloned().collect();
        roles.sort_by(|a, b| a.name().cmp(b.name()));
        roles
    }

    // === Role assignment ===

    /// Assigns the logger to a role and returns it. Re-assigning the same
    /// role is a no-op; a *different* role is refused until the current
    /// one is cleared explicitly.
    ///
    /// If a verbosity is currently set, the logger's level is resolved
    /// through the role right away.
    pub fn assign_role(&self, logger_name: &str, role_name: &str) -> Result<Arc<Logger>, RoleError> {
        let logger = self.logger(logger_name);

        let guard = self.shared.state.lock();
        let mut state = guard.borrow_mut();

        match logger.role_name() {
            Some(current) if current == role_name => return Ok(logger),
            Some(current) => {
                return Err(RoleError::AlreadyAssigned {
                    logger: logger.name().to_owned(),
                    current,
                })
            }
            None => {}
        }

        logger.set_role_name(Some(role_name.to_owned()));
        state
            .members
            .entry(role_name.to_owned())
            .or_default()
            .insert(logger.name_arc(), logger.clone());

        if let Some(verbosity) = self.shared.verbosity() {
            if let Some(role) = state.roles.get(role_name) {
                logger.set_level(role.get_level(Some(verbosity)));
            }
        }

        Ok(logger)
    }

    /// Clears the logger's role assignment, if any. The logger's level is
    /// recomputed once more through the role it was leaving, so it keeps a
    /// sensible threshold rather than whatever was last applied.
    pub fn clear_role(&self, logger_name: &str) {
        let logger = self.logger(logger_name);

        let guard = self.shared.state.lock();
        let mut state = guard.borrow_mut();

        // Snapshot before mutating: the reset below resolves through the
        // role this logger *was* using.
        let Some(current) = logger.role_name() else {
            return;
        };

        if let Some(members) = state.members.get_mut(&current) {
            members.remove(logger.name());
        }
        logger.set_role_name(None);

        if let Some(verbosity) = self.shared.verbosity() {
            if let Some(role) = state.roles.get(&current) {
                logger.set_level(role.get_level(Some(verbosity)));
            }
        }
    }

    // === Sinks ===

    /// Attaches a sink to every logger assigned to the role, or to every
    /// assigned logger at all for the `"*"` wildcard.
    pub fn add_sink(&self, sink: Arc<dyn Sink>, role_name: &str) {
        for logger in self.role_members(role_name) {
            logger.add_sink(sink.clone());
        }
    }

    /// The reverse of [`Manager::add_sink`], comparing sinks by identity.
    pub fn remove_sink(&self, sink: &Arc<dyn Sink>, role_name: &str) {
        for logger in self.role_members(role_name) {
            logger.remove_sink(sink);
        }
    }

    fn role_members(&self, role_name: &str) -> Vec<Arc<Logger>> {
        let guard = self.shared.state.lock();
        let state = guard.borrow();

        if role_name == WILDCARD_ROLE_NAME {
            state
                .members
                .values()
                .flat_map(|members| members.values().cloned())
                .collect()
        } else {
            state
                .members
                .get(role_name)
                .map(|members| members.values().cloned().collect())
                .unwrap_or_default()
        }
    }

    /// Fills the root logger's console slot: the sink every record that
    /// propagates to the root is offered to.
    pub fn set_console_sink(&self, sink: Option<Arc<dyn Sink>>) {
        self.root().set_console_sink(sink);
    }

    pub fn console_sink(&self) -> Option<Arc<dyn Sink>> {
        self.root().console_sink()
    }

    /// Fills the root logger's file slot.
    pub fn set_file_sink(&self, sink: Option<Arc<dyn Sink>>) {
        self.root().set_file_sink(sink);
    }

    pub fn file_sink(&self) -> Option<Arc<dyn Sink>> {
        self.root().file_sink()
    }

    /// Replaces the sink that receives records no attached sink took.
    /// `None` disables the fallback entirely; a single diagnostic notice
    /// is then printed the first time a record goes nowhere.
    pub fn set_last_resort(&self, sink: Option<Arc<dyn Sink>>) {
        *self.shared.last_resort.lock() = sink;
    }

    pub fn last_resort(&self) -> Option<Arc<dyn Sink>> {
        self.shared.last_resort()
    }

    /// Controls the once-per-manager "no sinks" diagnostic.
    pub fn warn_on_no_sinks(&self, enabled: bool) {
        self.shared.warn_on_no_sinks.store(enabled, Ordering::Relaxed);
    }
}

static DEFAULT_MANAGER: Lazy<Manager> = Lazy::new(Manager::new);

/// The lazily-created process-wide manager: a plain [`Manager`] that
/// nothing but convenience distinguishes.
pub fn default_manager() -> &'static Manager {
    &DEFAULT_MANAGER
}
