//! Load/save helpers shared by the file-backed stores.
//!
//! # Atomic saves
//!
//! [`write_atomic`] writes the new content to a temporary file in the same
//! directory as the target and then renames it over the target.  A rename
//! within one directory is atomic on every supported file system, so a
//! process killed mid-save leaves either the old file or the new one, never a
//! truncated mix.  The temporary file inherits the target's permissions.
//!
//! Text stores append instead (see [`append`]): shell rc files are often
//! symlinks into a dotfiles repository and must not be replaced by a rename.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::StoreError;
use crate::jsonc;

/// Indentation used for every JSON document the stores write.
const JSON_INDENT: &[u8] = b"    ";

/// Reads `path` as UTF-8, returning `None` if the file does not exist.
///
/// # Errors
///
/// Returns [`StoreError::PermissionDenied`] or [`StoreError::Io`] for any
/// failure other than "not found".
pub fn read_optional(path: &Path) -> Result<Option<String>, StoreError> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StoreError::io(path, e)),
    }
}

/// Loads a JSON-with-comments document.
///
/// Returns `None` when the file is missing or holds only whitespace and
/// comments.
///
/// # Errors
///
/// Returns [`StoreError::Parse`] if the content is not valid JSON, plus the
/// I/O errors of [`read_optional`].
pub fn load_json(path: &Path) -> Result<Option<Value>, StoreError> {
    let Some(content) = read_optional(path)? else {
        debug!(path = %path.display(), "store file absent");
        return Ok(None);
    };
    jsonc::parse(&content).map_err(|source| StoreError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Serializes `value` as 4-space indented JSON followed by a newline.
///
/// # Errors
///
/// Returns [`StoreError::Serialize`] if serialization fails.
pub fn to_pretty_json(path: &Path, value: &Value) -> Result<Vec<u8>, StoreError> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(JSON_INDENT);
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value
        .serialize(&mut serializer)
        .map_err(|source| StoreError::Serialize {
            path: path.to_path_buf(),
            source,
        })?;
    buf.push(b'\n');
    Ok(buf)
}

/// Writes `value` to `path` as pretty JSON via [`write_atomic`].
///
/// # Errors
///
/// See [`to_pretty_json`] and [`write_atomic`].
pub fn save_json(path: &Path, value: &Value) -> Result<(), StoreError> {
    let bytes = to_pretty_json(path, value)?;
    write_atomic(path, &bytes)
}

/// Replaces the content of `path` with `content` through a temp-file rename.
///
/// Creates missing parent directories.
///
/// # Errors
///
/// Returns [`StoreError::PermissionDenied`] or [`StoreError::Io`] if any step
/// fails.  The target is untouched in that case.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<(), StoreError> {
    let dir = parent_dir(path);
    fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| StoreError::io(dir, e))?;
    if let Ok(meta) = fs::metadata(path) {
        tmp.as_file()
            .set_permissions(meta.permissions())
            .map_err(|e| StoreError::io(path, e))?;
    }
    tmp.write_all(content).map_err(|e| StoreError::io(path, e))?;
    tmp.as_file().sync_all().map_err(|e| StoreError::io(path, e))?;
    tmp.persist(path)
        .map_err(|e| StoreError::io(path, e.error))?;

    debug!(path = %path.display(), bytes = content.len(), "store file written");
    Ok(())
}

/// Appends `text` to `path`, creating the file and its parent directories.
///
/// # Errors
///
/// Returns [`StoreError::PermissionDenied`] or [`StoreError::Io`].
pub fn append(path: &Path, text: &str) -> Result<(), StoreError> {
    let dir = parent_dir(path);
    fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| StoreError::io(path, e))?;
    file.write_all(text.as_bytes())
        .map_err(|e| StoreError::io(path, e))?;
    Ok(())
}

/// Returns the directory containing `path` (`.` for a bare file name).
fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_read_optional_missing_file_is_none() {
        let dir = TempDir::new().unwrap();
        let result = read_optional(&dir.path().join("absent.txt")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_load_json_accepts_comments() {
        // Arrange
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "// user settings\n{\"editor.fontSize\": 14}").unwrap();

        // Act
        let value = load_json(&path).unwrap();

        // Assert
        assert_eq!(value, Some(json!({"editor.fontSize": 14})));
    }

    #[test]
    fn test_load_json_invalid_content_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ \"a\": ").unwrap();
        let err = load_json(&path).unwrap_err();
        assert!(err.is_parse_error(), "got {err:?}");
    }

    #[test]
    fn test_to_pretty_json_uses_four_space_indent_and_trailing_newline() {
        let bytes = to_pretty_json(Path::new("x.json"), &json!({"a": {"b": 1}})).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text, "{\n    \"a\": {\n        \"b\": 1\n    }\n}\n");
    }

    #[test]
    fn test_write_atomic_creates_parent_directories() {
        // Arrange
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Code").join("User").join("settings.json");

        // Act
        write_atomic(&path, b"{}\n").unwrap();

        // Assert
        assert_eq!(fs::read_to_string(&path).unwrap(), "{}\n");
    }

    #[test]
    fn test_write_atomic_replaces_existing_content_and_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "old content that is longer than the new one").unwrap();

        write_atomic(&path, b"new").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
        let entries = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1, "temporary file must be renamed, not left behind");
    }

    #[cfg(unix)]
    #[test]
    fn test_write_atomic_keeps_target_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{}").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        write_atomic(&path, b"{\"a\": 1}").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o644);
    }

    #[test]
    fn test_append_creates_then_extends_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("profile").join("Microsoft.PowerShell_profile.ps1");

        append(&path, "first\n").unwrap();
        append(&path, "second\n").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }
}
