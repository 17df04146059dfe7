use std::time::SystemTime;

use verbo_core::Record;

use crate::formatters::*;

pub(crate) trait Theme {
    type Timestamp: Formatter<SystemTime>;
    type Level: Formatter<Record>;
    type LoggerName: Formatter<str>;
    type Payload: Formatter<Record>;
}

pub(crate) struct PlainTheme;

impl Theme for PlainTheme {
    type Level = Level;
    type LoggerName = LoggerName;
    type Payload = Payload;
    type Timestamp = Rfc3339Weak;
}

pub(crate) struct ColoredTheme;

impl Theme for ColoredTheme {
    type Level = ColoredLevel;
    type LoggerName = ColoredByHash<LoggerName>;
    type Payload = ColoredPayload;
    type Timestamp = Rfc3339Weak;
}
