use metrics::{Key, Label};

use crate::level::LevelValue;

fn labels_by_level(level: LevelValue) -> &'static [Label] {
    const fn f(value: &'static str) -> Label {
        Label::from_static_parts("level", value)
    }

    const CRITICAL_LABELS: &[Label] = &[f("Critical")];
    const ERROR_LABELS: &[Label] = &[f("Error")];
    const WARNING_LABELS: &[Label] = &[f("Warning")];
    const INFO_LABELS: &[Label] = &[f("Info")];
    const DEBUG_LABELS: &[Label] = &[f("Debug")];
    const NOTSET_LABELS: &[Label] = &[f("Notset")];

    // Non-canonical levels fall into the nearest bucket below.
    match level {
        l if l >= 50 => CRITICAL_LABELS,
        l if l >= 40 => ERROR_LABELS,
        l if l >= 30 => WARNING_LABELS,
        l if l >= 20 => INFO_LABELS,
        l if l >= 10 => DEBUG_LABELS,
        _ => NOTSET_LABELS,
    }
}

pub(crate) fn delivered_records_total(level: LevelValue) {
    let Some(recorder) = metrics::try_recorder() else {
        return;
    };
    let labels = labels_by_level(level);
    let key = Key::from_static_parts("verbo_delivered_records_total", labels);
    recorder.increment_counter(&key, 1);
}

pub(crate) fn failed_deliveries_total(level: LevelValue) {
    let Some(recorder) = metrics::try_recorder() else {
        return;
    };
    let labels = labels_by_level(level);
    let key = Key::from_static_parts("verbo_failed_deliveries_total", labels);
    recorder.increment_counter(&key, 1);
}

pub(crate) fn unhandled_records_total(level: LevelValue) {
    let Some(recorder) = metrics::try_recorder() else {
        return;
    };
    let labels = labels_by_level(level);
    let key = Key::from_static_parts("verbo_unhandled_records_total", labels);
    recorder.increment_counter(&key, 1);
}
