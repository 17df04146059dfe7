//! Canonical log levels and loose-to-canonical level resolution.

use std::sync::Arc;

use arc_swap::ArcSwap;
use fxhash::FxHashMap;
use parking_lot::Mutex;
use serde::Deserialize;

use crate::errors::LevelError;

/// An integer severity threshold. Larger values are more severe; records
/// below a threshold are suppressed at that threshold.
pub type LevelValue = i32;

pub const CRITICAL: LevelValue = 50;
pub const ERROR: LevelValue = 40;
pub const WARNING: LevelValue = 30;
pub const INFO: LevelValue = 20;
pub const DEBUG: LevelValue = 10;
/// "No own threshold": a logger at this level defers to its ancestors.
pub const NOTSET: LevelValue = 0;

/// A loosely-typed level setting: a raw value, a digit-string or a
/// case-insensitive level name.
///
/// Resolution happens in [`LevelTable::resolve`]. Keeping the input as a
/// closed set of variants means an unsupported input shape is a compile
/// error, not a runtime one.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum LevelSetting {
    Value(LevelValue),
    Name(String),
}

impl From<LevelValue> for LevelSetting {
    fn from(value: LevelValue) -> Self {
        Self::Value(value)
    }
}

impl From<&str> for LevelSetting {
    fn from(name: &str) -> Self {
        Self::Name(name.to_owned())
    }
}

impl From<String> for LevelSetting {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

struct TableInner {
    by_name: FxHashMap<String, LevelValue>,
    by_value: FxHashMap<LevelValue, Arc<str>>,
}

/// The process-wide table of known levels, name ↔ value.
///
/// Owned by a [`Manager`]; read on every resolution, written only when a
/// custom level is registered. Readers load an immutable snapshot, writers
/// republish it under a lock.
///
/// [`Manager`]: crate::Manager
pub struct LevelTable {
    inner: ArcSwap<TableInner>,
    write: Mutex<()>,
}

impl Default for LevelTable {
    fn default() -> Self {
        let mut by_name = FxHashMap::default();
        let mut by_value = FxHashMap::default();

        for (value, name) in [
            (CRITICAL, "CRITICAL"),
            (ERROR, "ERROR"),
            (WARNING, "WARNING"),
            (INFO, "INFO"),
            (DEBUG, "DEBUG"),
            (NOTSET, "NOTSET"),
        ] {
            by_name.insert(name.to_owned(), value);
            by_value.insert(value, Arc::from(name));
        }

        // Aliases resolve by name but never win the reverse lookup.
        by_name.insert("FATAL".to_owned(), CRITICAL);
        by_name.insert("WARN".to_owned(), WARNING);

        Self {
            inner: ArcSwap::new(Arc::new(TableInner { by_name, by_value })),
            write: Mutex::new(()),
        }
    }
}

impl LevelTable {
    /// Resolves a loose [`LevelSetting`] to a canonical value.
    ///
    /// Integers (and digit-strings) must be members of the table; other
    /// strings are looked up as names, case-insensitively. Misses fail
    /// loudly: a misconfigured level is a setup-time programming error.
    pub fn resolve(&self, setting: impl Into<LevelSetting>) -> Result<LevelValue, LevelError> {
        match setting.into() {
            LevelSetting::Value(value) => self.resolve_value(value),
            LevelSetting::Name(name) => {
                if !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit()) {
                    match name.parse() {
                        Ok(value) => self.resolve_value(value),
                        Err(_) => Err(self.unknown_name(name)),
                    }
                } else {
                    let inner = self.inner.load();
                    match inner.by_name.get(&name.to_uppercase()) {
                        Some(value) => Ok(*value),
                        None => Err(self.unknown_name(name)),
                    }
                }
            }
        }
    }

    fn resolve_value(&self, value: LevelValue) -> Result<LevelValue, LevelError> {
        if self.inner.load().by_value.contains_key(&value) {
            Ok(value)
        } else {
            Err(LevelError::UnknownLevel {
                value,
                known: self.known_levels(),
            })
        }
    }

    fn unknown_name(&self, name: String) -> LevelError {
        LevelError::UnknownLevelName {
            name,
            known: self.known_names(),
        }
    }

    /// Registers a custom level. The name resolves case-insensitively and
    /// becomes the display name of `value`, shadowing any previous one.
    pub fn register(&self, value: LevelValue, name: &str) {
        let _guard = self.write.lock();
        let prev = self.inner.load();

        let mut by_name = prev.by_name.clone();
        let mut by_value = prev.by_value.clone();
        let name = name.to_uppercase();
        by_value.insert(value, Arc::from(name.as_str()));
        by_name.insert(name, value);

        self.inner.store(Arc::new(TableInner { by_name, by_value }));
    }

    /// The display name of a value, `"Level <n>"` for unnamed ones.
    pub fn display_name(&self, value: LevelValue) -> Arc<str> {
        match self.inner.load().by_value.get(&value) {
            Some(name) => name.clone(),
            None => Arc::from(format!("Level {value}")),
        }
    }

    /// All known `(value, name)` pairs, most severe first.
    pub fn known_levels(&self) -> Vec<(LevelValue, String)> {
        let inner = self.inner.load();
        let mut known: Vec<_> = inner
            .by_value
            .iter()
            .map(|(value, name)| (*value, name.to_string()))
            .collect();
        known.sort_by_key(|(value, _)| std::cmp::Reverse(*value));
        known
    }

    /// All known names, including aliases, sorted.
    pub fn known_names(&self) -> Vec<String> {
        let inner = self.inner.load();
        let mut known: Vec<_> = inner.by_name.keys().cloned().collect();
        known.sort();
        known
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_values_names_and_digit_strings() {
        let table = LevelTable::default();

        // The same canonical value through every input shape.
        assert_eq!(table.resolve("DEBUG"), Ok(DEBUG));
        assert_eq!(table.resolve("debug"), Ok(DEBUG));
        assert_eq!(table.resolve("Debug"), Ok(DEBUG));
        assert_eq!(table.resolve(10), Ok(DEBUG));
        assert_eq!(table.resolve("10"), Ok(DEBUG));
    }

    #[test]
    fn resolves_aliases() {
        let table = LevelTable::default();
        assert_eq!(table.resolve("fatal"), Ok(CRITICAL));
        assert_eq!(table.resolve("warn"), Ok(WARNING));
        // But the display name stays canonical.
        assert_eq!(&*table.display_name(CRITICAL), "CRITICAL");
    }

    #[test]
    fn rejects_unknown_values() {
        let table = LevelTable::default();

        let err = table.resolve(17).unwrap_err();
        match err {
            LevelError::UnknownLevel { value, known } => {
                assert_eq!(value, 17);
                assert_eq!(known[0], (CRITICAL, "CRITICAL".to_owned()));
            }
            _ => panic!("wrong error: {err}"),
        }
    }

    #[test]
    fn rejects_unknown_names() {
        let table = LevelTable::default();

        let err = table.resolve("silly").unwrap_err();
        match err {
            LevelError::UnknownLevelName { name, known } => {
                assert_eq!(name, "silly");
                assert!(known.contains(&"WARN".to_owned()));
            }
            _ => panic!("wrong error: {err}"),
        }
    }

    #[test]
    fn observes_runtime_registration() {
        let table = LevelTable::default();
        assert!(table.resolve("lucky").is_err());

        table.register(8, "lucky");
        assert_eq!(table.resolve("lucky"), Ok(8));
        assert_eq!(table.resolve("LUCKY"), Ok(8));
        assert_eq!(table.resolve(8), Ok(8));
        assert_eq!(&*table.display_name(8), "LUCKY");
    }

    #[test]
    fn unnamed_display_name() {
        let table = LevelTable::default();
        assert_eq!(&*table.display_name(35), "Level 35");
    }
}
