//! Error type shared by every store.
//!
//! The variants follow the failure taxonomy of the apply engine:
//!
//! | Variant                          | Meaning                                          |
//! |----------------------------------|--------------------------------------------------|
//! | `Parse` / `UnexpectedShape`      | existing content is not in the expected format   |
//! | `NotFound`                       | a required backing resource does not exist       |
//! | `PermissionDenied`               | the OS refused the read or write                 |
//! | `Io`                             | any other file-system failure                    |
//! | `InvalidUpdate`                  | the requested change itself is malformed         |
//! | `Environment`                    | the persistent user environment rejected access  |
//!
//! A store that returns an error has not written anything: every check that
//! can fail runs before the save.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::jsonc::JsoncError;

/// Error type for store load/save operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The existing store content could not be parsed.
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: JsoncError,
    },

    /// The existing content is valid JSON but its root has the wrong type.
    #[error("unexpected content in {path}: expected a JSON {expected}")]
    UnexpectedShape { path: PathBuf, expected: &'static str },

    /// A backing resource the store requires does not exist.
    #[error("store not found: {path}")]
    NotFound { path: PathBuf },

    /// The OS denied access to the backing file.
    #[error("permission denied accessing {path}: {source}")]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file-system I/O error other than "permission denied".
    #[error("I/O error accessing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document could not be serialized back to JSON.
    #[error("failed to serialize {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The requested change is malformed (e.g. a scheme without a `name`).
    #[error("invalid update: {0}")]
    InvalidUpdate(String),

    /// Reading or writing a persistent user environment variable failed.
    #[error("cannot access user environment variable {variable}: {reason}")]
    Environment { variable: String, reason: String },
}

impl StoreError {
    /// Wraps an I/O error, promoting `PermissionDenied` to its own variant.
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::PermissionDenied {
            StoreError::PermissionDenied {
                path: path.to_path_buf(),
                source,
            }
        } else {
            StoreError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }

    /// Returns `true` for errors caused by malformed existing content.
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            StoreError::Parse { .. } | StoreError::UnexpectedShape { .. }
        )
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_io_promotes_permission_denied() {
        // Arrange
        let source = Error::new(ErrorKind::PermissionDenied, "denied");

        // Act
        let err = StoreError::io(Path::new("/etc/settings.json"), source);

        // Assert
        assert!(matches!(err, StoreError::PermissionDenied { .. }));
    }

    #[test]
    fn test_io_keeps_other_kinds_as_io() {
        let source = Error::new(ErrorKind::Other, "disk on fire");
        let err = StoreError::io(Path::new("/tmp/x"), source);
        assert!(matches!(err, StoreError::Io { .. }));
    }

    #[test]
    fn test_is_parse_error_covers_shape_errors() {
        let err = StoreError::UnexpectedShape {
            path: PathBuf::from("keybindings.json"),
            expected: "array",
        };
        assert!(err.is_parse_error());
        assert!(!StoreError::InvalidUpdate("x".into()).is_parse_error());
    }

    #[test]
    fn test_error_message_names_the_file() {
        let err = StoreError::NotFound {
            path: PathBuf::from("/home/u/.zshrc"),
        };
        assert!(err.to_string().contains(".zshrc"));
    }
}
