//! Human-readable console sink of the `verbo` logging toolkit.
//!
//! One record per line:
//!
//! ```text
//! 2026-08-07 12:34:56.123     INFO my_app.db - connected	host=10.0.0.3	attempts=2
//! ```
//!
//! Colorization follows the target stream: on by default when it is a
//! terminal, forced on or off through [`ConsoleOptions`].

#![warn(rust_2018_idioms, unreachable_pub)]

use std::io::{self, IsTerminal, Write};

use serde::Deserialize;

use verbo_core::{
    LevelSetting, LevelTable, Record, SetupError, Sink, SinkCore, SinkError, Verbosity,
    VerbosityLevelsFilter,
};

use crate::{
    formatters::Formatter,
    theme::{ColoredTheme, PlainTheme, Theme},
};

mod formatters;
mod theme;

/// The target stream of a [`ConsoleSink`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum StreamKind {
    #[default]
    Stdout,
    Stderr,
}

/// Whether to emit ANSI colors.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Colorization {
    /// Colors when the target stream is a terminal.
    #[default]
    Auto,
    Always,
    Never,
}

/// Options of a [`ConsoleSink`], usually deserialized from configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ConsoleOptions {
    pub stream: StreamKind,
    pub colorization: Colorization,
    /// The sink's own level threshold.
    pub level: LevelSetting,
    /// Per-scope verbosity floors, see
    /// [`VerbosityLevelsFilter`].
    pub verbosity_levels: Option<Vec<(String, Vec<(Verbosity, LevelSetting)>)>>,
}

impl Default for ConsoleOptions {
    fn default() -> Self {
        Self {
            stream: StreamKind::default(),
            colorization: Colorization::default(),
            level: LevelSetting::Value(verbo_core::level::NOTSET),
            verbosity_levels: None,
        }
    }
}

/// A sink rendering records for humans, one themed line each.
pub struct ConsoleSink {
    core: SinkCore,
    stream: StreamKind,
    use_colors: bool,
}

impl std::fmt::Debug for ConsoleSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleSink")
            .field("stream", &self.stream)
            .field("use_colors", &self.use_colors)
            .finish_non_exhaustive()
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self {
            core: SinkCore::default(),
            stream: StreamKind::Stdout,
            use_colors: io::stdout().is_terminal(),
        }
    }
}

impl ConsoleSink {
    /// Stdout, auto colors, no own threshold.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_options(levels: &LevelTable, options: ConsoleOptions) -> Result<Self, SetupError> {
        let core = SinkCore::new(levels.resolve(options.level)?);

        if let Some(scopes) = options.verbosity_levels {
            core.set_filter(Some(VerbosityLevelsFilter::from_settings(levels, scopes)?));
        }

        let use_colors = match options.colorization {
            Colorization::Always => true,
            Colorization::Never => false,
            Colorization::Auto => match options.stream {
                StreamKind::Stdout => io::stdout().is_terminal(),
                StreamKind::Stderr => io::stderr().is_terminal(),
            },
        };

        Ok(Self {
            core,
            stream: options.stream,
            use_colors,
        })
    }

    /// Stdout with an explicit own threshold.
    pub fn at_level(
        levels: &LevelTable,
        level: impl Into<LevelSetting>,
    ) -> Result<Self, SetupError> {
        Self::from_options(
            levels,
            ConsoleOptions {
                level: level.into(),
                ..ConsoleOptions::default()
            },
        )
    }
}

impl Sink for ConsoleSink {
    fn core(&self) -> &SinkCore {
        &self.core
    }

    fn emit(&self, record: &Record) -> Result<(), SinkError> {
        let mut buffer = String::with_capacity(256);
        if self.use_colors {
            format_record::<ColoredTheme>(&mut buffer, record);
        } else {
            format_record::<PlainTheme>(&mut buffer, record);
        }

        match self.stream {
            StreamKind::Stdout => {
                let mut out = io::stdout().lock();
                out.write_all(buffer.as_bytes())?;
                out.flush()?;
            }
            StreamKind::Stderr => {
                let mut out = io::stderr().lock();
                out.write_all(buffer.as_bytes())?;
                out.flush()?;
            }
        }

        Ok(())
    }

    fn kind(&self) -> &'static str {
        "console sink"
    }
}

fn format_record<T: Theme>(out: &mut String, record: &Record) {
    // <timestamp> <level> <name> - <message>\t<fields>\terr=<chain>
    T::Timestamp::fmt(out, &record.timestamp);
    out.push(' ');
    T::Level::fmt(out, record);
    out.push(' ');
    T::LoggerName::fmt(out, &record.logger_name);
    out.push_str(" - ");
    T::Payload::fmt(out, record);
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use std::{
        sync::Arc,
        time::{Duration, SystemTime},
    };

    use verbo_core::{level::INFO, ErrorInfo};

    use super::*;

    fn record() -> Record {
        Record {
            timestamp: SystemTime::UNIX_EPOCH + Duration::from_millis(1_700_000_000_123),
            level: INFO,
            level_name: Arc::from("INFO"),
            logger_name: Arc::from("my_app.db"),
            message: "connected".to_owned(),
            fields: vec![
                ("host", serde_json::json!("10.0.0.3")),
                ("attempts", serde_json::json!(2)),
            ],
            error: None,
        }
    }

    #[test]
    fn plain_line_layout() {
        let mut out = String::new();
        format_record::<PlainTheme>(&mut out, &record());

        assert_eq!(
            out,
            "2023-11-14 22:13:20.123     INFO my_app.db - connected\thost=10.0.0.3\tattempts=2\n"
        );
    }

    #[test]
    fn error_chain_is_appended() {
        let mut record = record();
        record.error = Some(ErrorInfo {
            message: "handshake failed".to_owned(),
            chain: vec!["connection refused".to_owned()],
        });

        let mut out = String::new();
        format_record::<PlainTheme>(&mut out, &record);

        assert!(out.ends_with("\terr=handshake failed: connection refused\n"));
    }

    #[test]
    fn multiline_messages_stay_on_one_line() {
        let mut record = record();
        record.message = "first\nsecond".to_owned();
        record.fields.clear();

        let mut out = String::new();
        format_record::<PlainTheme>(&mut out, &record);

        assert!(out.contains("first\\nsecond"));
        assert_eq!(out.matches('\n').count(), 1);
    }

    #[test]
    fn root_logger_renders_as_root() {
        let mut record = record();
        record.logger_name = Arc::from("");
        record.fields.clear();

        let mut out = String::new();
        format_record::<PlainTheme>(&mut out, &record);

        assert!(out.contains(" root - connected"));
    }

    #[test]
    fn colored_line_wraps_the_level() {
        let mut out = String::new();
        format_record::<ColoredTheme>(&mut out, &record());

        // INFO is green; keys are bold.
        assert!(out.contains("\x1b[32m    INFO\x1b[0m"));
        assert!(out.contains("\x1b[1mhost\x1b[22m=10.0.0.3"));
    }

    #[test]
    fn options_deserialize_from_toml() {
        let options: ConsoleOptions = toml::from_str(
            r#"
            stream = "Stderr"
            colorization = "Always"
            level = "debug"
            verbosity_levels = [["pkg", [[0, "WARNING"], [2, "DEBUG"]]]]
            "#,
        )
        .unwrap();

        assert_eq!(options.stream, StreamKind::Stderr);
        assert_eq!(options.colorization, Colorization::Always);

        let table = LevelTable::default();
        let sink = ConsoleSink::from_options(&table, options).unwrap();
        assert_eq!(sink.core().level(), verbo_core::level::DEBUG);
        assert!(sink.core().filter().is_some());
        assert!(sink.use_colors);
    }

    #[test]
    fn level_resolution_failures_surface() {
        let table = LevelTable::default();
        let err = ConsoleSink::at_level(&table, "silly").unwrap_err();
        assert!(matches!(err, SetupError::Level(_)));
    }
}
