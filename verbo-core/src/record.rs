//! The immutable record view handed to sinks.

use std::{sync::Arc, time::SystemTime};

use serde_json::Value;

use crate::level::LevelValue;

/// Structured key/value data captured on a log call.
pub type Fields = Vec<(&'static str, Value)>;

/// One emitted log record. Sinks receive it by reference and must not
/// assume anything about delivery order across loggers.
#[derive(Debug, Clone)]
pub struct Record {
    pub timestamp: SystemTime,
    pub level: LevelValue,
    /// The display name of `level` at the time of emission.
    pub level_name: Arc<str>,
    pub logger_name: Arc<str>,
    pub message: String,
    pub fields: Fields,
    pub error: Option<ErrorInfo>,
}

/// A captured error: its message and the messages of its source chain,
/// outermost first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub message: String,
    pub chain: Vec<String>,
}

impl ErrorInfo {
    pub fn capture(error: &(dyn std::error::Error + 'static)) -> Self {
        let message = error.to_string();
        let mut chain = Vec::new();
        let mut source = error.source();
        while let Some(cause) = source {
            chain.push(cause.to_string());
            source = cause.source();
        }

        Self { message, chain }
    }
}
