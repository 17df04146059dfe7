//! Structured emission macros.
//!
//! ```
//! use verbo_core::{info, Manager};
//!
//! let manager = Manager::new();
//! let logger = manager.logger("my_app.db");
//! info!(logger, "connected", host = "10.0.0.3", attempts = 2);
//! ```

/// Emits a record at an arbitrary level with structured fields.
///
/// Field values go through `serde_json::to_value`; a value that fails to
/// serialize degrades to a placeholder string instead of failing the call.
/// Fields are not even constructed when the level is disabled.
#[macro_export]
macro_rules! event {
    ($logger:expr, $level:expr, $msg:expr) => {
        $crate::event!($logger, $level, $msg,)
    };
    ($logger:expr, $level:expr, $msg:expr, $($key:ident = $value:expr),* $(,)?) => {{
        let logger = &$logger;
        let level = $level;
        if logger.enabled_for(level) {
            logger.log(level, $msg, ::std::vec![$(
                (stringify!($key), $crate::_priv::field_value(&$value)),
            )*]);
        }
    }};
}

/// Emits at [`CRITICAL`](crate::level::CRITICAL).
#[macro_export]
macro_rules! critical {
    ($logger:expr, $($rest:tt)*) => {
        $crate::event!($logger, $crate::level::CRITICAL, $($rest)*)
    };
}

/// Emits at [`ERROR`](crate::level::ERROR).
#[macro_export]
macro_rules! error {
    ($logger:expr, $($rest:tt)*) => {
        $crate::event!($logger, $crate::level::ERROR, $($rest)*)
    };
}

/// Emits at [`WARNING`](crate::level::WARNING).
#[macro_export]
macro_rules! warning {
    ($logger:expr, $($rest:tt)*) => {
        $crate::event!($logger, $crate::level::WARNING, $($rest)*)
    };
}

/// Emits at [`INFO`](crate::level::INFO).
#[macro_export]
macro_rules! info {
    ($logger:expr, $($rest:tt)*) => {
        $crate::event!($logger, $crate::level::INFO, $($rest)*)
    };
}

/// Emits at [`DEBUG`](crate::level::DEBUG).
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($rest:tt)*) => {
        $crate::event!($logger, $crate::level::DEBUG, $($rest)*)
    };
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use crate::{
        level::{DEBUG, INFO},
        record::Record,
        sink::{Sink, SinkCore, SinkError},
        Manager,
    };

    #[derive(Default)]
    struct Probe {
        core: SinkCore,
        records: Mutex<Vec<Record>>,
    }

    impl Sink for Probe {
        fn core(&self) -> &SinkCore {
            &self.core
        }

        fn emit(&self, record: &Record) -> Result<(), SinkError> {
            self.records.lock().unwrap().push(record.clone());
            Ok(())
        }
    }

    #[test]
    fn captures_structured_fields() {
        let manager = Manager::new();
        let probe = Arc::new(Probe::default());
        let logger = manager.logger("my_app");
        logger.add_sink(probe.clone());
        logger.set_level(INFO);

        info!(logger, "connected", host = "10.0.0.3", attempts = 2);

        let records = probe.records.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].message, "connected");
        assert_eq!(records[0].level, INFO);
        assert_eq!(&*records[0].level_name, "INFO");
        assert_eq!(
            records[0].fields,
            vec![
                ("host", serde_json::json!("10.0.0.3")),
                ("attempts", serde_json::json!(2)),
            ]
        );
    }

    #[test]
    fn disabled_levels_emit_nothing() {
        let manager = Manager::new();
        let probe = Arc::new(Probe::default());
        let logger = manager.logger("my_app");
        logger.add_sink(probe.clone());
        logger.set_level(INFO);

        debug!(logger, "noise", detail = "nope");

        assert!(probe.records.lock().unwrap().is_empty());
    }

    #[test]
    fn trailing_commas_and_no_fields() {
        let manager = Manager::new();
        let probe = Arc::new(Probe::default());
        let logger = manager.logger("my_app");
        logger.add_sink(probe.clone());
        logger.set_level(DEBUG);

        debug!(logger, "bare");
        debug!(logger, "trailing", key = 1,);

        assert_eq!(probe.records.lock().unwrap().len(), 2);
    }
}
