//! Telemetry records and sinks.
//!
//! Each research step produces one [`TelemetryRecord`] and hands it to a
//! [`TelemetrySink`] under a record name. Sinks are fire-and-forget: write
//! failures are logged and never reach the caller.

use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{info, warn};

/// Ordered key/value payload for one step.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TelemetryRecord(Map<String, Value>);

impl TelemetryRecord {
    /// Empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a JSON value, replacing any previous value for `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    /// Serialize `value` and insert it. A value that cannot be serialized is
    /// recorded as `{"serialization_error": ...}` so the key is never lost.
    pub fn insert_serialized<T: Serialize + ?Sized>(&mut self, key: impl Into<String>, value: &T) {
        let value = serde_json::to_value(value)
            .unwrap_or_else(|e| serde_json::json!({ "serialization_error": e.to_string() }));
        self.insert(key, value);
    }

    /// Value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Whether `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// The record as a JSON object.
    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

/// Destination for telemetry records.
pub trait TelemetrySink: Send + Sync {
    /// Accept a named record.
    fn log(&self, name: &str, record: &TelemetryRecord);
}

// ---------------------------------------------------------------------------
// In-memory sink
// ---------------------------------------------------------------------------

/// Keeps records in memory for inspection.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<(String, TelemetryRecord)>>>,
}

impl MemorySink {
    /// Empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every record received so far, in arrival order.
    pub fn records(&self) -> Vec<(String, TelemetryRecord)> {
        match self.records.lock() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Number of records received.
    pub fn len(&self) -> usize {
        match self.records.lock() {
            Ok(records) => records.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    /// Whether no records have been received.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TelemetrySink for MemorySink {
    fn log(&self, name: &str, record: &TelemetryRecord) {
        let mut records = match self.records.lock() {
            Ok(records) => records,
            Err(poisoned) => poisoned.into_inner(),
        };
        records.push((name.to_owned(), record.clone()));
    }
}

// ---------------------------------------------------------------------------
// JSON lines sink
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct JsonlEntry<'a> {
    timestamp: String,
    name: &'a str,
    data: &'a TelemetryRecord,
}

/// Appends one JSON object per record to a writer.
pub struct JsonlSink {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl std::fmt::Debug for JsonlSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonlSink").finish_non_exhaustive()
    }
}

impl JsonlSink {
    /// Open (or create) `path` in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| anyhow::anyhow!("failed to open telemetry file {}: {e}", path.display()))?;
        Ok(Self::from_writer(Box::new(file)))
    }

    /// Write to an arbitrary writer (for testing).
    pub fn from_writer(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    fn write_entry(&self, name: &str, record: &TelemetryRecord) -> anyhow::Result<()> {
        let entry = JsonlEntry {
            timestamp: Utc::now().to_rfc3339(),
            name,
            data: record,
        };
        let line = serde_json::to_string(&entry)?;
        let mut writer = self
            .writer
            .lock()
            .map_err(|e| anyhow::anyhow!("telemetry lock poisoned: {e}"))?;
        writeln!(writer, "{line}")?;
        writer.flush()?;
        Ok(())
    }
}

impl TelemetrySink for JsonlSink {
    fn log(&self, name: &str, record: &TelemetryRecord) {
        if let Err(e) = self.write_entry(name, record) {
            warn!(error = %e, record = name, "failed to write telemetry record");
        }
    }
}

// ---------------------------------------------------------------------------
// Tracing sink
// ---------------------------------------------------------------------------

/// Emits each record as an `info` event on the `telemetry` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl TelemetrySink for TracingSink {
    fn log(&self, name: &str, record: &TelemetryRecord) {
        match serde_json::to_string(record) {
            Ok(data) => info!(target: "telemetry", record = name, %data, "telemetry record"),
            Err(e) => warn!(error = %e, record = name, "failed to serialize telemetry record"),
        }
    }
}
