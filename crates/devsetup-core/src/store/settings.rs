//! Key-value settings store backed by a JSON object file.
//!
//! Used for VS Code's user `settings.json`, where keys are dot-qualified
//! strings such as `terminal.integrated.fontFamily` and values are opaque.
//!
//! Writes are unconditional: applying a value equal to the current one still
//! rewrites the file.  Because the document is serialized deterministically
//! (insertion order kept, 4-space indent), a second identical apply produces
//! byte-identical content.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::StoreError;
use crate::file;
use crate::store::KeyValueStore;

/// Which keys an [`KeyValueStore::apply_all`] call actually changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsReport {
    /// Keys whose value was absent or different before the call.
    pub changed: Vec<String>,
    /// Keys that already held the requested value.
    pub unchanged: Vec<String>,
}

/// A JSON object file of independent settings.
#[derive(Debug, Clone)]
pub struct JsonSettingsFile {
    path: PathBuf,
}

impl JsonSettingsFile {
    /// Creates a store for the settings file at `path`.  Nothing is read yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the document; a missing or blank file yields an empty object.
    fn load(&self) -> Result<Map<String, Value>, StoreError> {
        match file::load_json(&self.path)? {
            None => Ok(Map::new()),
            Some(Value::Object(map)) => Ok(map),
            Some(_) => Err(StoreError::UnexpectedShape {
                path: self.path.clone(),
                expected: "object",
            }),
        }
    }

    fn save(&self, document: Map<String, Value>) -> Result<(), StoreError> {
        file::save_json(&self.path, &Value::Object(document))
    }
}

impl KeyValueStore for JsonSettingsFile {
    fn apply(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut document = self.load()?;
        debug!(path = %self.path.display(), key, "setting value");
        document.insert(key.to_string(), value);
        self.save(document)
    }

    fn apply_all(&self, settings: Vec<(String, Value)>) -> Result<SettingsReport, StoreError> {
        let mut document = self.load()?;
        let mut report = SettingsReport::default();
        for (key, value) in settings {
            if document.get(&key) == Some(&value) {
                report.unchanged.push(key.clone());
            } else {
                report.changed.push(key.clone());
            }
            document.insert(key, value);
        }
        self.save(document)?;
        Ok(report)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
