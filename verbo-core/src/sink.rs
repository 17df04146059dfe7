//! The sink abstraction: record consumers with their own thresholds.

use std::sync::{
    atomic::{AtomicI32, Ordering},
    Arc,
};

use arc_swap::ArcSwapOption;

use crate::{
    level::{LevelValue, NOTSET},
    record::Record,
    verbosity::VerbosityLevelsFilter,
};

/// The error a sink may return from [`Sink::emit`]. Reported by the
/// dispatcher to the process error stream; never surfaced to the call
/// site that emitted the record.
pub type SinkError = Box<dyn std::error::Error + Send + Sync>;

/// A record consumer: a console renderer, a file writer, a test probe.
///
/// A sink's level is independent of any logger's level. A *priority* sink
/// additionally demands records be evaluated against its own level alone,
/// regardless of the owning logger's configured severity, which makes it
/// suitable for monitoring pipelines that must see more than the main
/// output does.
pub trait Sink: Send + Sync + 'static {
    /// The common level/priority/filter state.
    fn core(&self) -> &SinkCore;

    /// Consumes one record. Blocking here blocks the emitting thread.
    fn emit(&self, record: &Record) -> Result<(), SinkError>;

    /// A short identifier used in dispatch diagnostics.
    fn kind(&self) -> &'static str {
        "sink"
    }
}

/// The state shared by all sink implementations: an own level threshold,
/// the priority flag and an optional verbosity-scope filter.
pub struct SinkCore {
    level: AtomicI32,
    priority: bool,
    filter: ArcSwapOption<VerbosityLevelsFilter>,
}

impl Default for SinkCore {
    fn default() -> Self {
        Self::new(NOTSET)
    }
}

impl SinkCore {
    pub fn new(level: LevelValue) -> Self {
        Self {
            level: AtomicI32::new(level),
            priority: false,
            filter: ArcSwapOption::empty(),
        }
    }

    /// Marks the sink as a priority one. The flag is fixed for the sink's
    /// lifetime; the level stays mutable.
    pub fn priority(mut self) -> Self {
        self.priority = true;
        self
    }

    pub fn level(&self) -> LevelValue {
        self.level.load(Ordering::Relaxed)
    }

    /// Sets the threshold. Any integer is accepted: comparison is by raw
    /// value, so custom levels work without being registered.
    pub fn set_level(&self, level: LevelValue) {
        self.level.store(level, Ordering::Relaxed);
    }

    pub fn is_priority(&self) -> bool {
        self.priority
    }

    pub fn set_filter(&self, filter: Option<VerbosityLevelsFilter>) {
        self.filter.store(filter.map(Arc::new));
    }

    pub fn filter(&self) -> Option<Arc<VerbosityLevelsFilter>> {
        self.filter.load_full()
    }
}
