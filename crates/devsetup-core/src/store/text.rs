//! Append-only text store for shell rc files and PowerShell profiles.
//!
//! Presence is decided by a plain substring search for a caller-chosen
//! *fragment*, not the full line.  This lets an installer recognize a line
//! the user wrote by hand with different arguments (for example a prompt
//! init line pointing at another theme) and leave it alone.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::StoreError;
use crate::file;
use crate::store::{ApplyOutcome, TextAppendStore};

/// A free-form text file.
#[derive(Debug, Clone)]
pub struct TextFile {
    path: PathBuf,
}

impl TextFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `true` if `fragment` occurs anywhere in the file.  A missing
    /// file contains nothing.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the file exists but cannot be read.
    pub fn contains(&self, fragment: &str) -> Result<bool, StoreError> {
        Ok(file::read_optional(&self.path)?
            .map(|content| content.contains(fragment))
            .unwrap_or(false))
    }
}

impl TextAppendStore for TextFile {
    fn ensure_line(&self, expected_fragment: &str, line: &str) -> Result<ApplyOutcome, StoreError> {
        if self.contains(expected_fragment)? {
            debug!(path = %self.path.display(), fragment = expected_fragment, "line already present");
            return Ok(ApplyOutcome::AlreadyPresent);
        }

        file::append(&self.path, &format!("\n{line}\n"))?;
        Ok(ApplyOutcome::Applied)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
