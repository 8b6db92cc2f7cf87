//! Store contracts and their file-backed implementations.
//!
//! # What is a store? (for beginners)
//!
//! A *store* wraps exactly one physical configuration resource: a file on
//! disk or a persistent environment value.  Feature installers never parse or
//! write those resources themselves; they describe the change they want and
//! hand it to the matching store, which decides whether the resource already
//! reflects the change.
//!
//! There is one trait per store family:
//!
//! | Trait              | Resource                      | Idempotence rule                        |
//! |--------------------|-------------------------------|-----------------------------------------|
//! | [`KeyValueStore`]  | JSON object                   | last write wins                         |
//! | [`RecordListStore`]| JSON array of records         | skip if identity fields already present |
//! | [`TextAppendStore`]| plain text file               | skip if fragment is a substring         |
//! | [`PathStore`]      | persistent PATH               | skip if folder is a substring           |
//! | [`DeepMergeStore`] | nested JSON document          | recursive merge, schemes keyed by name  |
//!
//! Implementations live in the sub-modules.  Platform code only decides
//! *where* each store lives; the semantics are the same everywhere.
//!
//! Every call is a full load → mutate → save cycle.  Stores hold no cached
//! document, so two calls never see stale state.

use serde_json::{Map, Value};

use crate::error::StoreError;

pub mod path;
pub mod record_list;
pub mod settings;
pub mod terminal;
pub mod text;

pub use path::PathReport;
pub use settings::SettingsReport;

/// Result of an idempotent apply operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The store was modified and saved.
    Applied,
    /// The store already reflected the change; nothing was written.
    AlreadyPresent,
}

impl ApplyOutcome {
    /// Returns `true` if the store was written.
    pub fn was_applied(self) -> bool {
        matches!(self, ApplyOutcome::Applied)
    }
}

/// A JSON object of independent settings (e.g. VS Code `settings.json`).
pub trait KeyValueStore {
    /// Sets `key` to `value`, unconditionally overwriting any existing value.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the existing document cannot be read or
    /// parsed, or the new one cannot be written.
    fn apply(&self, key: &str, value: Value) -> Result<(), StoreError>;

    /// Sets several keys in one load/save cycle.
    ///
    /// # Errors
    ///
    /// Same as [`KeyValueStore::apply`].
    fn apply_all(&self, settings: Vec<(String, Value)>) -> Result<SettingsReport, StoreError>;
}

/// A JSON array of records deduplicated by identity fields
/// (e.g. VS Code `keybindings.json`).
pub trait RecordListStore {
    /// Appends `record` unless a record with the same identity exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidUpdate`] if `identity` is empty, otherwise
    /// the load/save errors of the backing file.
    fn append(
        &self,
        record: Map<String, Value>,
        identity: &[&str],
    ) -> Result<ApplyOutcome, StoreError>;
}

/// A free-form text file such as a shell rc file or PowerShell profile.
pub trait TextAppendStore {
    /// Appends `line` unless `expected_fragment` already occurs in the file.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the file cannot be read or appended to.
    fn ensure_line(&self, expected_fragment: &str, line: &str) -> Result<ApplyOutcome, StoreError>;
}

/// The user's persistent PATH.
pub trait PathStore {
    /// Makes `folder` part of the persistent PATH.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backing resource cannot be read or
    /// written.  Targets already updated before the failure stay updated.
    fn ensure_folder_on_path(&self, folder: &str) -> Result<PathReport, StoreError>;
}

/// A nested JSON document merged recursively (e.g. Windows Terminal settings).
pub trait DeepMergeStore {
    /// Merges `updates` into the document.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the document cannot be parsed, an update is
    /// malformed, or the save fails.  Nothing is written on error.
    fn apply(&self, updates: Map<String, Value>) -> Result<ApplyOutcome, StoreError>;
}

// ── Tests ─────────────────────────────────────────────────────────────────────
