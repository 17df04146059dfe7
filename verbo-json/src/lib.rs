//! JSON-lines file sink of the `verbo` logging toolkit.
//!
//! One record per line, machine-first:
//!
//! ```json
//! {"ts":"2026-08-07T12:34:56.123Z","lvl":"INFO","lvlno":20,"log":"my_app.db","msg":"connected","data":{"host":"10.0.0.3"}}
//! ```
//!
//! The sink is a *priority* one by default: monitoring pipelines usually
//! want every record the file level admits, regardless of how quiet the
//! owning logger is configured to be. [`FileSink::reopen`] supports log
//! rotation.

#![warn(rust_2018_idioms, unreachable_pub)]

use std::{
    fs::{File, OpenOptions},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use parking_lot::Mutex;
use serde::{
    ser::{SerializeMap, SerializeStruct},
    Deserialize, Serialize, Serializer,
};

use verbo_core::{
    LevelSetting, LevelTable, Record, SetupError, Sink, SinkCore, SinkError, Verbosity,
    VerbosityLevelsFilter,
};

/// Options of a [`FileSink`], usually deserialized from configuration.
#[derive(Debug, Deserialize)]
pub struct FileOptions {
    pub path: PathBuf,
    /// Append to an existing file (the default) or truncate it.
    #[serde(default = "enabled")]
    pub append: bool,
    /// The sink's own level threshold.
    #[serde(default = "notset")]
    pub level: LevelSetting,
    /// Whether the sink's level is evaluated independently of the owning
    /// logger's level.
    #[serde(default = "enabled")]
    pub priority: bool,
    /// Per-scope verbosity floors, see [`VerbosityLevelsFilter`].
    #[serde(default)]
    pub verbosity_levels: Option<Vec<(String, Vec<(Verbosity, LevelSetting)>)>>,
}

fn enabled() -> bool {
    true
}

fn notset() -> LevelSetting {
    LevelSetting::Value(verbo_core::level::NOTSET)
}

impl FileOptions {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            append: true,
            level: notset(),
            priority: true,
            verbosity_levels: None,
        }
    }
}

/// A sink appending one JSON object per record to a file.
pub struct FileSink {
    core: SinkCore,
    path: PathBuf,
    file: Mutex<BufWriter<File>>,
}

impl FileSink {
    /// Opens `path` for appending; priority, no own threshold.
    pub fn new(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let file = open(&path, true)?;

        Ok(Self {
            core: SinkCore::default().priority(),
            path,
            file: Mutex::new(file),
        })
    }

    pub fn from_options(levels: &LevelTable, options: FileOptions) -> Result<Self, SetupError> {
        let core = SinkCore::new(levels.resolve(options.level)?);
        let core = if options.priority { core.priority() } else { core };

        if let Some(scopes) = options.verbosity_levels {
            core.set_filter(Some(VerbosityLevelsFilter::from_settings(levels, scopes)?));
        }

        let file = open(&options.path, options.append)?;

        Ok(Self {
            core,
            path: options.path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reopens the output file, usually after rotation moved it away.
    /// Concurrent emitters block for the duration of the swap.
    pub fn reopen(&self) -> io::Result<()> {
        let new = open(&self.path, true)?;
        let mut file = self.file.lock();
        let _ = file.flush();
        *file = new;
        Ok(())
    }
}

fn open(path: &Path, append: bool) -> io::Result<BufWriter<File>> {
    let file = OpenOptions::new()
        .create(true)
        .append(append)
        .write(true)
        .truncate(!append)
        .open(path)?;
    Ok(BufWriter::new(file))
}

impl Sink for FileSink {
    fn core(&self) -> &SinkCore {
        &self.core
    }

    fn emit(&self, record: &Record) -> Result<(), SinkError> {
        let mut line = serde_json::to_vec(&JsonRecord(record))?;
        line.push(b'\n');

        let mut file = self.file.lock();
        file.write_all(&line)?;
        // One record, one durable line: readers tail this file live.
        file.flush()?;
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "file sink"
    }
}

struct JsonRecord<'a>(&'a Record);

impl Serialize for JsonRecord<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let record = self.0;
        let mut len = 5;
        if !record.fields.is_empty() {
            len += 1;
        }
        if record.error.is_some() {
            len += 1;
        }

        let mut s = serializer.serialize_struct("Record", len)?;
        s.serialize_field(
            "ts",
            &humantime::format_rfc3339_millis(record.timestamp).to_string(),
        )?;
        s.serialize_field("lvl", &*record.level_name)?;
        s.serialize_field("lvlno", &record.level)?;
        s.serialize_field("log", &*record.logger_name)?;
        s.serialize_field("msg", &record.message)?;
        if !record.fields.is_empty() {
            s.serialize_field("data", &FieldsMap(record))?;
        }
        if let Some(error) = &record.error {
            s.serialize_field(
                "error",
                &ErrorView {
                    msg: &error.message,
                    chain: &error.chain,
                },
            )?;
        }
        s.end()
    }
}

struct FieldsMap<'a>(&'a Record);

impl Serialize for FieldsMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let fields = &self.0.fields;
        let mut map = serializer.serialize_map(Some(fields.len()))?;
        for (key, value) in fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[derive(Serialize)]
struct ErrorView<'a> {
    msg: &'a str,
    chain: &'a [String],
}

#[cfg(test)]
mod tests {
    use std::{
        fs,
        sync::Arc,
        time::{Duration, SystemTime},
    };

    use tempdir::TempDir;
    use verbo_core::level::{DEBUG, INFO};

    use super::*;

    fn record(message: &str) -> Record {
        Record {
            timestamp: SystemTime::UNIX_EPOCH + Duration::from_millis(1_700_000_000_123),
            level: INFO,
            level_name: Arc::from("INFO"),
            logger_name: Arc::from("my_app.db"),
            message: message.to_owned(),
            fields: vec![("host", serde_json::json!("10.0.0.3"))],
            error: None,
        }
    }

    #[test]
    fn writes_one_json_object_per_line() {
        let tmp_dir = TempDir::new("verbo_json_test").unwrap();
        let path = tmp_dir.path().join("out.jsonl");

        let sink = FileSink::new(&path).unwrap();
        sink.emit(&record("first")).unwrap();
        sink.emit(&record("second")).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let parsed: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed["ts"], "2023-11-14T22:13:20.123Z");
        assert_eq!(parsed["lvl"], "INFO");
        assert_eq!(parsed["lvlno"], 20);
        assert_eq!(parsed["log"], "my_app.db");
        assert_eq!(parsed["msg"], "first");
        assert_eq!(parsed["data"]["host"], "10.0.0.3");
        assert!(parsed.get("error").is_none());
    }

    #[test]
    fn serializes_the_error_chain() {
        let tmp_dir = TempDir::new("verbo_json_test").unwrap();
        let path = tmp_dir.path().join("out.jsonl");

        let mut record = record("sync aborted");
        record.fields.clear();
        record.error = Some(verbo_core::ErrorInfo {
            message: "handshake failed".to_owned(),
            chain: vec!["connection refused".to_owned()],
        });

        let sink = FileSink::new(&path).unwrap();
        sink.emit(&record).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(content.trim()).unwrap();
        assert!(parsed.get("data").is_none());
        assert_eq!(parsed["error"]["msg"], "handshake failed");
        assert_eq!(parsed["error"]["chain"][0], "connection refused");
    }

    #[test]
    fn reopen_follows_rotation() {
        let tmp_dir = TempDir::new("verbo_json_test").unwrap();
        let path = tmp_dir.path().join("out.jsonl");

        let sink = FileSink::new(&path).unwrap();
        sink.emit(&record("before rotation")).unwrap();

        let rotated = tmp_dir.path().join("out.jsonl.1");
        fs::rename(&path, &rotated).unwrap();
        sink.reopen().unwrap();
        sink.emit(&record("after rotation")).unwrap();

        assert!(fs::read_to_string(&rotated).unwrap().contains("before"));
        assert!(fs::read_to_string(&path).unwrap().contains("after"));
    }

    #[test]
    fn options_deserialize_from_toml() {
        let tmp_dir = TempDir::new("verbo_json_test").unwrap();
        let path = tmp_dir.path().join("out.jsonl").display().to_string();

        let options: FileOptions = toml::from_str(&format!(
            r#"
            path = {path:?}
            level = "debug"
            priority = false
            "#
        ))
        .unwrap();
        assert!(options.append);
        assert!(!options.priority);

        let table = LevelTable::default();
        let sink = FileSink::from_options(&table, options).unwrap();
        assert_eq!(sink.core().level(), DEBUG);
        assert!(!sink.core().is_priority());
    }

    #[test]
    fn priority_by_default() {
        let tmp_dir = TempDir::new("verbo_json_test").unwrap();
        let sink = FileSink::new(tmp_dir.path().join("out.jsonl")).unwrap();
        assert!(sink.core().is_priority());
    }
}
