//! Ordered record list store with identity-based deduplication.
//!
//! Used for VS Code's `keybindings.json`, a JSON array of objects where the
//! `(key, command)` pair identifies a binding:
//!
//! ```json
//! [
//!     { "key": "ctrl+k", "command": "workbench.action.showCommands", "when": "editorFocus" }
//! ]
//! ```
//!
//! An incoming record is appended at the end unless an existing record has
//! the same values at every identity field.  A match suppresses the append
//! entirely: the existing record's other fields are not updated and the file
//! is not rewritten.
//!
//! A file whose JSON root is not an array is treated as an empty list and is
//! replaced on the next append.  Invalid JSON is still an error.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::file;
use crate::merge;
use crate::store::{ApplyOutcome, RecordListStore};

/// Identity fields of a VS Code keybinding.
pub const KEYBINDING_IDENTITY: &[&str] = &["key", "command"];

/// A JSON array file of records.
#[derive(Debug, Clone)]
pub struct JsonRecordList {
    path: PathBuf,
}

impl JsonRecordList {
    /// Creates a store for the list file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Vec<Value>, StoreError> {
        match file::load_json(&self.path)? {
            None => Ok(Vec::new()),
            Some(Value::Array(list)) => Ok(list),
            Some(_) => {
                warn!(
                    path = %self.path.display(),
                    "record list is not a JSON array; starting from an empty list"
                );
                Ok(Vec::new())
            }
        }
    }
}

impl RecordListStore for JsonRecordList {
    fn append(
        &self,
        record: Map<String, Value>,
        identity: &[&str],
    ) -> Result<ApplyOutcome, StoreError> {
        if identity.is_empty() {
            return Err(StoreError::InvalidUpdate(
                "record identity needs at least one field".to_string(),
            ));
        }

        let mut records = self.load()?;
        if let Some(index) = merge::find_record(&records, &record, identity) {
            debug!(path = %self.path.display(), index, "record already present");
            return Ok(ApplyOutcome::AlreadyPresent);
        }

        records.push(Value::Object(record));
        file::save_json(&self.path, &Value::Array(records))?;
        Ok(ApplyOutcome::Applied)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
