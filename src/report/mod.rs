//! Persisted statistics log
//!
//! The log is a JSON array with one flat string-to-number object per
//! reporting trigger. NaN is not representable in JSON, so NaN values are
//! written as `null` and read back as NaN; the key set of each element stays
//! complete either way.
//!
//! [`LogReport`] rewrites the whole file on each append, so the log on disk
//! is always a valid, complete array. [`load_log`] inverts the format into
//! per-key series for plotting.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Number, Value};

use crate::stats::Record;
use crate::{Error, Result};

/// Per-key series extracted from a log: one value per reporting trigger.
pub type LogSeries = BTreeMap<String, Vec<f64>>;

/// Append-only writer for the statistics log.
#[derive(Debug)]
pub struct LogReport {
    path: PathBuf,
    entries: Vec<Record>,
}

impl LogReport {
    /// Open a log file, loading any existing entries so appends continue the
    /// sequence.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() { read_entries(&path)? } else { Vec::new() };
        Ok(Self { path, entries })
    }

    /// Open a log file, discarding any previous contents.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(Self { path, entries: Vec::new() })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> &[Record] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append one record and rewrite the file.
    pub fn append(&mut self, record: Record) -> Result<()> {
        self.entries.push(record);
        self.flush()
    }

    fn flush(&self) -> Result<()> {
        let json = Value::Array(self.entries.iter().map(record_to_value).collect());
        let text = serde_json::to_string_pretty(&json)
            .map_err(|e| Error::Serialization(e.to_string()))?;
        fs::write(&self.path, text)?;
        Ok(())
    }
}

/// Load a log into per-key series.
///
/// Every element contributes one sample per key it carries; `null` values
/// become NaN.
///
/// # Errors
///
/// [`Error::MalformedLog`] when the file is not a JSON array of flat
/// string-to-number objects.
pub fn load_log(path: impl AsRef<Path>) -> Result<LogSeries> {
    let entries = read_entries(path.as_ref())?;
    let mut series = LogSeries::new();
    for record in &entries {
        for (key, value) in record {
            series.entry(key.clone()).or_default().push(*value);
        }
    }
    Ok(series)
}

fn read_entries(path: &Path) -> Result<Vec<Record>> {
    let text = fs::read_to_string(path)?;
    let json: Value =
        serde_json::from_str(&text).map_err(|e| Error::MalformedLog(e.to_string()))?;
    let Value::Array(elements) = json else {
        return Err(Error::MalformedLog("expected a top-level array".to_string()));
    };

    elements.iter().map(value_to_record).collect()
}

fn record_to_value(record: &Record) -> Value {
    let mut object = Map::new();
    for (key, value) in record {
        let json_value = Number::from_f64(*value).map_or(Value::Null, Value::Number);
        object.insert(key.clone(), json_value);
    }
    Value::Object(object)
}

fn value_to_record(value: &Value) -> Result<Record> {
    let Value::Object(object) = value else {
        return Err(Error::MalformedLog("expected an object per trigger".to_string()));
    };

    let mut record = Record::new();
    for (key, value) in object {
        let number = match value {
            Value::Null => f64::NAN,
            Value::Number(n) => n
                .as_f64()
                .ok_or_else(|| Error::MalformedLog(format!("non-finite number at {key}")))?,
            other => {
                return Err(Error::MalformedLog(format!(
                    "expected number or null at {key}, got {other}"
                )))
            }
        };
        record.insert(key.clone(), number);
    }
    Ok(record)
}
