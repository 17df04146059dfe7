//! Logger nodes of the hierarchy.

use std::sync::{
    atomic::{AtomicBool, AtomicI32, Ordering},
    Arc,
};

use arc_swap::ArcSwap;
use parking_lot::Mutex;

use crate::{
    dispatch,
    level::{LevelValue, NOTSET},
    manager::Shared,
    record::{ErrorInfo, Fields, Record},
    sink::Sink,
};

/// A named node of the logger hierarchy.
///
/// Nodes are produced by [`Manager::logger`] and live for the rest of the
/// process. A node's own level is `NOTSET` (inherit) until a role, a
/// verbosity change or an explicit call sets it. Sinks attach either
/// anonymously ([`add_sink`]) or through the two named slots ("console"
/// and "file") which hold at most one sink each and replace atomically.
///
/// [`Manager::logger`]: crate::Manager::logger
/// [`add_sink`]: Logger::add_sink
pub struct Logger {
    name: Arc<str>,
    parent: Option<Arc<Logger>>,
    level: AtomicI32,
    propagate: AtomicBool,
    /// Bookkeeping behind the per-node mutex; `snapshot` mirrors `list`
    /// for lock-free readers.
    sinks: Mutex<SinkSet>,
    snapshot: ArcSwap<Vec<Arc<dyn Sink>>>,
    role_name: Mutex<Option<String>>,
    shared: Arc<Shared>,
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name)
            .field("level", &self.level.load(Ordering::Relaxed))
            .field("propagate", &self.propagate.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
struct SinkSet {
    list: Vec<Arc<dyn Sink>>,
    console: NamedSinkSlot,
    file: NamedSinkSlot,
}

/// A named single-occupancy sink slot. Setting a new occupant detaches
/// the previous one from the owning logger in the same critical section.
#[derive(Default)]
struct NamedSinkSlot {
    current: Option<Arc<dyn Sink>>,
}

impl NamedSinkSlot {
    fn set(&mut self, list: &mut Vec<Arc<dyn Sink>>, sink: Option<Arc<dyn Sink>>) {
        if let (Some(current), Some(new)) = (&self.current, &sink) {
            if Arc::ptr_eq(current, new) {
                return;
            }
        }

        if let Some(old) = self.current.take() {
            list.retain(|s| !Arc::ptr_eq(s, &old));
        }
        if let Some(sink) = sink {
            list.push(sink.clone());
            self.current = Some(sink);
        }
    }

    fn get(&self) -> Option<Arc<dyn Sink>> {
        self.current.clone()
    }

    fn forget_if(&mut self, sink: &Arc<dyn Sink>) {
        if let Some(current) = &self.current {
            if Arc::ptr_eq(current, sink) {
                self.current = None;
            }
        }
    }
}

impl Logger {
    pub(crate) fn new(name: Arc<str>, parent: Option<Arc<Logger>>, shared: Arc<Shared>) -> Self {
        Self::with_level(name, parent, shared, NOTSET)
    }

    pub(crate) fn with_level(
        name: Arc<str>,
        parent: Option<Arc<Logger>>,
        shared: Arc<Shared>,
        level: LevelValue,
    ) -> Self {
        Self {
            name,
            parent,
            level: AtomicI32::new(level),
            propagate: AtomicBool::new(true),
            sinks: Mutex::new(SinkSet::default()),
            snapshot: ArcSwap::new(Arc::new(Vec::new())),
            role_name: Mutex::new(None),
            shared,
        }
    }

    /// The dot-delimited hierarchical name; empty for the root.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn name_arc(&self) -> Arc<str> {
        self.name.clone()
    }

    pub fn parent(&self) -> Option<&Arc<Logger>> {
        self.parent.as_ref()
    }

    /// The own threshold; `NOTSET` defers to ancestors.
    pub fn level(&self) -> LevelValue {
        self.level.load(Ordering::Relaxed)
    }

    pub fn set_level(&self, level: LevelValue) {
        self.level.store(level, Ordering::Relaxed);
    }

    /// Whether records propagate past this node to ancestor sinks.
    pub fn propagate(&self) -> bool {
        self.propagate.load(Ordering::Relaxed)
    }

    pub fn set_propagate(&self, propagate: bool) {
        self.propagate.store(propagate, Ordering::Relaxed);
    }

    /// The role this logger is assigned to, if any.
    pub fn role_name(&self) -> Option<String> {
        self.role_name.lock().clone()
    }

    pub(crate) fn set_role_name(&self, role_name: Option<String>) {
        *self.role_name.lock() = role_name;
    }

    pub(crate) fn shared(&self) -> &Arc<Shared> {
        &self.shared
    }

    // === Sinks ===

    pub fn add_sink(&self, sink: Arc<dyn Sink>) {
        self.with_sinks(|set| set.list.push(sink));
    }

    /// Detaches a sink (compared by identity). Clears a named slot too if
    /// the sink occupied one.
    pub fn remove_sink(&self, sink: &Arc<dyn Sink>) {
        self.with_sinks(|set| {
            set.list.retain(|s| !Arc::ptr_eq(s, sink));
            set.console.forget_if(sink);
            set.file.forget_if(sink);
        });
    }

    /// A point-in-time snapshot of the attached sinks.
    pub fn sinks(&self) -> Arc<Vec<Arc<dyn Sink>>> {
        self.snapshot.load_full()
    }

    pub fn console_sink(&self) -> Option<Arc<dyn Sink>> {
        self.sinks.lock().console.get()
    }

    /// Fills the "console" slot, replacing and detaching any previous
    /// occupant; `None` clears it.
    pub fn set_console_sink(&self, sink: Option<Arc<dyn Sink>>) {
        self.with_sinks(|set| {
            let SinkSet { list, console, .. } = set;
            console.set(list, sink);
        });
    }

    pub fn file_sink(&self) -> Option<Arc<dyn Sink>> {
        self.sinks.lock().file.get()
    }

    /// Fills the "file" slot, replacing and detaching any previous
    /// occupant; `None` clears it.
    pub fn set_file_sink(&self, sink: Option<Arc<dyn Sink>>) {
        self.with_sinks(|set| {
            let SinkSet { list, file, .. } = set;
            file.set(list, sink);
        });
    }

    fn with_sinks<R>(&self, f: impl FnOnce(&mut SinkSet) -> R) -> R {
        let mut set = self.sinks.lock();
        let result = f(&mut set);
        self.snapshot.store(Arc::new(set.list.clone()));
        result
    }

    // === Levels ===

    /// The standard effective level: the first non-`NOTSET` own level
    /// walking up the ancestry, or `NOTSET` if there is none.
    pub fn standard_effective_level(&self) -> LevelValue {
        let mut current = Some(self);
        while let Some(logger) = current {
            let level = logger.level();
            if level != NOTSET {
                return level;
            }
            current = logger.parent.as_deref();
        }
        NOTSET
    }

    /// The minimum non-`NOTSET` level among priority sinks on the
    /// sink-visibility chain; `NOTSET` when there are none.
    pub(crate) fn priority_floor(&self) -> LevelValue {
        let mut floor = NOTSET;
        for node in self.visible_chain() {
            for sink in node.sinks().iter() {
                let core = sink.core();
                if core.is_priority() {
                    let level = core.level();
                    if level != NOTSET && (floor == NOTSET || level < floor) {
                        floor = level;
                    }
                }
            }
        }
        floor
    }

    /// The effective level: the standard one combined with the priority
    /// floor. A priority sink lowers the gate so its records survive to
    /// dispatch; it never raises it, and non-priority sinks stay gated by
    /// the standard level alone (see the dispatcher).
    pub fn effective_level(&self) -> LevelValue {
        let standard = self.standard_effective_level();
        let floor = self.priority_floor();

        if standard != NOTSET && floor != NOTSET {
            standard.min(floor)
        } else {
            // Picks the non-zero one, or NOTSET if both are unset.
            standard.max(floor)
        }
    }

    pub fn enabled_for(&self, level: LevelValue) -> bool {
        level >= self.effective_level()
    }

    /// This node, then ancestors while each visited node propagates.
    pub(crate) fn visible_chain(&self) -> Chain<'_> {
        Chain { next: Some(self) }
    }

    // === Emission ===

    /// Emits a record with structured fields. Prefer the `info!`-family
    /// macros, which skip field construction for disabled levels.
    pub fn log(&self, level: LevelValue, message: impl Into<String>, fields: Fields) {
        self.log_inner(level, message.into(), fields, None);
    }

    /// Emits a record carrying a captured error and its source chain.
    pub fn log_with_error(
        &self,
        level: LevelValue,
        message: impl Into<String>,
        fields: Fields,
        error: &(dyn std::error::Error + 'static),
    ) {
        self.log_inner(level, message.into(), fields, Some(ErrorInfo::capture(error)));
    }

    fn log_inner(
        &self,
        level: LevelValue,
        message: String,
        fields: Fields,
        error: Option<ErrorInfo>,
    ) {
        if !self.enabled_for(level) {
            return;
        }

        let record = Record {
            timestamp: std::time::SystemTime::now(),
            level,
            level_name: self.shared.levels().display_name(level),
            logger_name: self.name_arc(),
            message,
            fields,
            error,
        };

        dispatch::dispatch(self, &record);
    }
}

pub(crate) struct Chain<'a> {
    next: Option<&'a Logger>,
}

impl<'a> Iterator for Chain<'a> {
    type Item = &'a Logger;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = if current.propagate() {
            current.parent.as_deref()
        } else {
            None
        };
        Some(current)
    }
}
