//! Record delivery: per-sink effective levels and fallbacks.

use std::sync::Arc;

use crate::{
    level::LevelValue,
    logger::Logger,
    manager::Shared,
    record::Record,
    sink::{Sink, SinkError},
    stats,
    verbosity::Verbosity,
};

/// Offers the record to every sink on the logger's visibility chain.
///
/// Each sink is gated by its *effective* level, not its raw one: a
/// priority sink answers to its own level alone, while a regular sink is
/// gated by whichever is stricter between its own level and the logger's
/// standard effective level. On top of that, a sink's verbosity filter
/// (when attached) must pass.
///
/// A failing sink is reported to the process error stream and skipped;
/// it never prevents delivery to the remaining sinks or reaches the
/// emitting call site.
pub(crate) fn dispatch(logger: &Logger, record: &Record) {
    let shared = logger.shared();
    let verbosity = shared.verbosity();
    let standard = logger.standard_effective_level();

    let mut seen = 0usize;
    for node in logger.visible_chain() {
        for sink in node.sinks().iter() {
            seen += 1;
            offer(sink, record, standard, verbosity);
        }
    }

    if seen == 0 {
        fallback(shared, record);
    }
}

fn offer(
    sink: &Arc<dyn Sink>,
    record: &Record,
    standard_level: LevelValue,
    verbosity: Option<Verbosity>,
) {
    let core = sink.core();

    let threshold = if core.is_priority() {
        core.level()
    } else {
        standard_level.max(core.level())
    };
    if record.level < threshold {
        return;
    }

    if let Some(filter) = core.filter() {
        if !filter.should_pass(&record.logger_name, record.level, verbosity) {
            return;
        }
    }

    match sink.emit(record) {
        Ok(()) => stats::delivered_records_total(record.level),
        Err(err) => {
            stats::failed_deliveries_total(record.level);
            report_sink_error(sink.kind(), record, &err);
        }
    }
}

/// No sink anywhere on the chain: hand the record to the last-resort sink
/// if it meets that sink's threshold, otherwise complain once per manager.
fn fallback(shared: &Arc<Shared>, record: &Record) {
    stats::unhandled_records_total(record.level);

    if let Some(last_resort) = shared.last_resort() {
        if record.level >= last_resort.core().level() {
            if let Err(err) = last_resort.emit(record) {
                report_sink_error(last_resort.kind(), record, &err);
            }
        }
    } else if shared.should_warn_no_sinks() {
        eprintln!(
            "verbo: no sinks could be found for logger {:?}",
            record.logger_name
        );
    }
}

fn report_sink_error(kind: &str, record: &Record, err: &SinkError) {
    eprintln!(
        "verbo: {kind} failed on a record from logger {:?}: {err}",
        record.logger_name
    );
}

/// The default last-resort sink: bare lines on stderr, warnings and up.
pub(crate) struct StderrSink {
    core: crate::sink::SinkCore,
}

impl StderrSink {
    pub(crate) fn new(level: LevelValue) -> Self {
        Self {
            core: crate::sink::SinkCore::new(level),
        }
    }
}

impl Sink for StderrSink {
    fn core(&self) -> &crate::sink::SinkCore {
        &self.core
    }

    fn emit(&self, record: &Record) -> Result<(), SinkError> {
        eprintln!(
            "{} {} - {}",
            record.level_name, record.logger_name, record.message
        );
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "stderr sink"
    }
}
