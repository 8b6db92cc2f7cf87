//! Deep-merge store for a terminal emulator's nested settings document.
//!
//! Windows Terminal keeps profiles, defaults and color schemes in one JSON
//! document:
//!
//! ```json
//! {
//!     "defaultProfile": "{574e775e-4f2a-5b96-ac1e-a2962a402336}",
//!     "profiles": { "defaults": { "font": { "face": "Cascadia Mono NF" } } },
//!     "schemes": [ { "name": "Gruvbox Dark", "background": "#282828" } ]
//! }
//! ```
//!
//! Updates are merged with [`merge::apply_terminal_updates`]: nested objects
//! merge key by key, `schemes` entries are matched by `name`, everything else
//! is replaced.  The file is written only if the merge changed something.
//!
//! Unlike the VS Code stores, a missing file is an error here.  The document
//! belongs to the terminal application, which creates it on first launch;
//! writing a fresh one would shadow the application's own defaults.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::StoreError;
use crate::file;
use crate::merge::{self, MergeError};
use crate::store::{ApplyOutcome, DeepMergeStore};

/// A nested JSON settings document owned by a terminal emulator.
#[derive(Debug, Clone)]
pub struct TerminalSettingsFile {
    path: PathBuf,
}

impl TerminalSettingsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Map<String, Value>, StoreError> {
        match file::load_json(&self.path)? {
            None => Err(StoreError::NotFound {
                path: self.path.clone(),
            }),
            Some(Value::Object(map)) => Ok(map),
            Some(_) => Err(StoreError::UnexpectedShape {
                path: self.path.clone(),
                expected: "object",
            }),
        }
    }

    fn map_merge_error(&self, err: MergeError) -> StoreError {
        match err {
            MergeError::MissingIdentity { .. } => StoreError::InvalidUpdate(err.to_string()),
            MergeError::NotAnArray { .. } => StoreError::UnexpectedShape {
                path: self.path.clone(),
                expected: "array of schemes",
            },
        }
    }
}

impl DeepMergeStore for TerminalSettingsFile {
    fn apply(&self, updates: Map<String, Value>) -> Result<ApplyOutcome, StoreError> {
        let mut document = self.load()?;

        let changed = merge::apply_terminal_updates(&mut document, updates)
            .map_err(|e| self.map_merge_error(e))?;
        if !changed {
            debug!(path = %self.path.display(), "terminal settings already up to date");
            return Ok(ApplyOutcome::AlreadyPresent);
        }

        file::save_json(&self.path, &Value::Object(document))?;
        Ok(ApplyOutcome::Applied)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn obj(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("fixture must be an object, got {other}"),
        }
    }

    fn store_with(dir: &TempDir, content: &str) -> TerminalSettingsFile {
        let path = dir.path().join("LocalState").join("settings.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        TerminalSettingsFile::new(path)
    }

    fn read(store: &TerminalSettingsFile) -> Value {
        serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap()
    }

    #[test]
    fn test_apply_merges_nested_font_without_touching_siblings() {
        // Arrange
        let dir = TempDir::new().unwrap();
        let store = store_with(
            &dir,
            r#"{"profiles": {"defaults": {"opacity": 90}, "list": [{"name": "pwsh"}]}}"#,
        );

        // Act
        let outcome = store
            .apply(obj(json!({"profiles": {"defaults": {"font": {"face": "Cascadia Mono NF"}}}})))
            .unwrap();

        // Assert
        assert_eq!(outcome, ApplyOutcome::Applied);
        assert_eq!(
            read(&store),
            json!({"profiles": {
                "defaults": {"opacity": 90, "font": {"face": "Cascadia Mono NF"}},
                "list": [{"name": "pwsh"}]
            }})
        );
    }

    #[test]
    fn test_apply_replaces_scheme_in_place_and_appends_new_one() {
        // Arrange
        let dir = TempDir::new().unwrap();
        let store = store_with(
            &dir,
            r##"{"schemes": [
                {"name": "Campbell", "background": "#0C0C0C"},
                {"name": "Gruvbox Dark", "background": "#000000"}
            ]}"##,
        );

        // Act
        store
            .apply(obj(json!({"schemes": [
                {"name": "Gruvbox Dark", "background": "#282828"},
                {"name": "One Half Dark", "background": "#282C34"}
            ]})))
            .unwrap();

        // Assert
        assert_eq!(
            read(&store)["schemes"],
            json!([
                {"name": "Campbell", "background": "#0C0C0C"},
                {"name": "Gruvbox Dark", "background": "#282828"},
                {"name": "One Half Dark", "background": "#282C34"}
            ])
        );
    }

    #[test]
    fn test_apply_already_reflected_skips_write_and_keeps_comments() {
        // Arrange
        let dir = TempDir::new().unwrap();
        let original = "// managed by Windows Terminal\n{\"defaultProfile\": \"PowerShell\"}\n";
        let store = store_with(&dir, original);

        // Act
        let outcome = store.apply(obj(json!({"defaultProfile": "PowerShell"}))).unwrap();

        // Assert
        assert_eq!(outcome, ApplyOutcome::AlreadyPresent);
        assert_eq!(fs::read_to_string(store.path()).unwrap(), original);
    }

    #[test]
    fn test_apply_twice_second_call_is_no_op() {
        let dir = TempDir::new().unwrap();
        let store = store_with(&dir, "{}");
        let updates = json!({"schemes": [{"name": "Gruvbox Dark"}], "profiles": {"defaults": {"font": {"face": "X"}}}});

        assert_eq!(store.apply(obj(updates.clone())).unwrap(), ApplyOutcome::Applied);
        let first = fs::read(store.path()).unwrap();
        assert_eq!(store.apply(obj(updates)).unwrap(), ApplyOutcome::AlreadyPresent);
        assert_eq!(fs::read(store.path()).unwrap(), first);
    }

    #[test]
    fn test_apply_on_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = TerminalSettingsFile::new(dir.path().join("settings.json"));

        let result = store.apply(obj(json!({"defaultProfile": "PowerShell"})));

        assert!(matches!(result, Err(StoreError::NotFound { .. })));
        assert!(!store.path().exists());
    }

    #[test]
    fn test_apply_on_malformed_file_fails_without_writing() {
        let dir = TempDir::new().unwrap();
        let original = "{\"profiles\": {";
        let store = store_with(&dir, original);

        let result = store.apply(obj(json!({"defaultProfile": "PowerShell"})));

        assert!(matches!(result, Err(StoreError::Parse { .. })));
        assert_eq!(fs::read_to_string(store.path()).unwrap(), original);
    }

    #[test]
    fn test_apply_scheme_without_name_is_rejected_before_write() {
        // Arrange
        let dir = TempDir::new().unwrap();
        let original = r#"{"defaultProfile": "cmd"}"#;
        let store = store_with(&dir, original);

        // Act
        let result = store.apply(obj(json!({
            "defaultProfile": "PowerShell",
            "schemes": [{"background": "#282828"}]
        })));

        // Assert
        assert!(matches!(result, Err(StoreError::InvalidUpdate(_))));
        assert_eq!(fs::read_to_string(store.path()).unwrap(), original);
    }

    #[test]
    fn test_apply_when_existing_schemes_is_not_array_is_unexpected_shape() {
        let dir = TempDir::new().unwrap();
        let store = store_with(&dir, r#"{"schemes": {"name": "odd"}}"#);

        let result = store.apply(obj(json!({"schemes": [{"name": "Gruvbox Dark"}]})));

        assert!(matches!(result, Err(StoreError::UnexpectedShape { .. })));
    }
}
