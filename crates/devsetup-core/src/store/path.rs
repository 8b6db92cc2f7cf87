//! Persistent PATH stores.
//!
//! # Two backends, one contract (for beginners)
//!
//! "Put this folder on my PATH for good" means different things per OS:
//!
//! - **Windows** keeps the user PATH as a single `;`-separated string in the
//!   registry (`HKCU\Environment\Path`).  [`RegistryPathStore`] edits that
//!   string through the [`UserEnvironment`] trait, so tests run against a
//!   [`MemoryEnvironment`] instead of the real registry.
//!
//! - **Linux** has no such value; each shell builds PATH from its rc file.
//!   [`ShellRcPathStore`] appends an `export PATH="$PATH:<folder>"` line to
//!   every rc file that exists.
//!
//! Presence is a literal substring test on the stored text, not a comparison
//! of normalized paths: `C:\Tools` is considered present in
//! `C:\Tools\bin;...`.
//!
//! # Process environment
//!
//! A registry write only affects processes started afterwards.  When the
//! registry store writes, it returns an [`EnvironmentPatch`] in the
//! [`PathReport`]; the caller applies it to make the folder visible to child
//! processes spawned later in the same run.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, info};

use crate::error::StoreError;
use crate::store::text::TextFile;
use crate::store::{PathStore, TextAppendStore};

/// Name of the user environment value holding the persistent PATH.
pub const PATH_VARIABLE: &str = "Path";

/// Separator used inside the registry PATH string.
pub const REGISTRY_SEPARATOR: char = ';';

/// Separator of the running process's PATH.
#[cfg(windows)]
const PROCESS_SEPARATOR: char = ';';
#[cfg(not(windows))]
const PROCESS_SEPARATOR: char = ':';

// ── User environment ──────────────────────────────────────────────────────────

/// Read/write access to persistent per-user environment values.
pub trait UserEnvironment {
    /// Returns the value named `name`, or `None` if it is not set.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Environment`] if the backing storage cannot be
    /// read.
    fn read(&self, name: &str) -> Result<Option<String>, StoreError>;

    /// Stores `value` under `name`, expanding `%VAR%` references at use time
    /// where the backend supports it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Environment`] if the value cannot be written.
    fn write(&self, name: &str, value: &str) -> Result<(), StoreError>;
}

/// In-memory [`UserEnvironment`] used by tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryEnvironment {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an environment pre-populated with one value.
    pub fn with_value(name: &str, value: &str) -> Self {
        let env = Self::new();
        env.values
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(name.to_string(), value.to_string());
        env
    }

    /// Returns the current value of `name`.
    pub fn get(&self, name: &str) -> Option<String> {
        self.values
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(name)
            .cloned()
    }
}

impl UserEnvironment for MemoryEnvironment {
    fn read(&self, name: &str) -> Result<Option<String>, StoreError> {
        Ok(self.get(name))
    }

    fn write(&self, name: &str, value: &str) -> Result<(), StoreError> {
        self.values
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(name.to_string(), value.to_string());
        Ok(())
    }
}

// ── Report types ──────────────────────────────────────────────────────────────

/// One place a PATH entry can be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathTarget {
    /// The user environment value (`HKCU\Environment\Path`).
    Registry,
    /// A shell rc file.
    RcFile(PathBuf),
}

/// A change the caller should make to the running process's environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentPatch {
    /// Process variable to extend (always `PATH` today).
    pub variable: String,
    /// Entry to append.
    pub append: String,
}

impl EnvironmentPatch {
    /// Creates a patch that appends `folder` to the process `PATH`.
    pub fn append_to_path(folder: &str) -> Self {
        Self {
            variable: "PATH".to_string(),
            append: folder.to_string(),
        }
    }

    /// Returns `current` with the patch applied.
    pub fn patched_value(&self, current: &str) -> String {
        if current.is_empty() {
            self.append.clone()
        } else {
            format!("{current}{PROCESS_SEPARATOR}{}", self.append)
        }
    }

    /// Applies the patch to the environment of the current process.
    pub fn apply(&self) {
        let current = std::env::var(&self.variable).unwrap_or_default();
        if current.contains(&self.append) {
            return;
        }
        std::env::set_var(&self.variable, self.patched_value(&current));
        debug!(variable = %self.variable, entry = %self.append, "process environment patched");
    }
}

/// Outcome of [`PathStore::ensure_folder_on_path`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathReport {
    pub updated: Vec<PathTarget>,
    pub already_present: Vec<PathTarget>,
    /// Targets that do not exist and were left alone.
    pub skipped: Vec<PathTarget>,
    /// Present only when a persistent write happened that the running
    /// process cannot see yet.
    pub env_patch: Option<EnvironmentPatch>,
}

impl PathReport {
    /// Returns `true` if any target was written.
    pub fn changed(&self) -> bool {
        !self.updated.is_empty()
    }
}

// ── Registry-backed store ─────────────────────────────────────────────────────

/// PATH stored as one `;`-separated user environment value.
#[derive(Debug)]
pub struct RegistryPathStore<E: UserEnvironment> {
    env: E,
}

impl<E: UserEnvironment> RegistryPathStore<E> {
    pub fn new(env: E) -> Self {
        Self { env }
    }

    /// Returns the wrapped environment.
    pub fn environment(&self) -> &E {
        &self.env
    }
}

impl<E: UserEnvironment> PathStore for RegistryPathStore<E> {
    fn ensure_folder_on_path(&self, folder: &str) -> Result<PathReport, StoreError> {
        let mut report = PathReport::default();
        let current = self.env.read(PATH_VARIABLE)?.unwrap_or_default();

        if current.contains(folder) {
            debug!(folder, "folder already on user PATH");
            report.already_present.push(PathTarget::Registry);
            return Ok(report);
        }

        let updated = if current.is_empty() {
            folder.to_string()
        } else {
            format!("{current}{REGISTRY_SEPARATOR}{folder}")
        };
        self.env.write(PATH_VARIABLE, &updated)?;
        info!(status = "ok", folder, "added folder to user PATH");

        report.updated.push(PathTarget::Registry);
        report.env_patch = Some(EnvironmentPatch::append_to_path(folder));
        Ok(report)
    }
}

// ── Rc-file-backed store ──────────────────────────────────────────────────────

/// PATH persisted through `export` lines in shell rc files.
#[derive(Debug, Clone)]
pub struct ShellRcPathStore {
    rc_files: Vec<PathBuf>,
}

impl ShellRcPathStore {
    pub fn new(rc_files: Vec<PathBuf>) -> Self {
        Self { rc_files }
    }

    /// Uses `~/.bashrc` and `~/.zshrc` under `home`.
    pub fn for_home(home: &Path) -> Self {
        Self::new(vec![home.join(".bashrc"), home.join(".zshrc")])
    }

    pub fn rc_files(&self) -> &[PathBuf] {
        &self.rc_files
    }

    /// The line appended for `folder`, which doubles as its presence fragment.
    pub fn export_line(folder: &str) -> String {
        format!("export PATH=\"$PATH:{folder}\"")
    }
}

impl PathStore for ShellRcPathStore {
    fn ensure_folder_on_path(&self, folder: &str) -> Result<PathReport, StoreError> {
        let mut report = PathReport::default();
        let line = Self::export_line(folder);

        for rc in &self.rc_files {
            let target = PathTarget::RcFile(rc.clone());
            if !rc.exists() {
                debug!(path = %rc.display(), "rc file absent, skipping");
                report.skipped.push(target);
                continue;
            }

            if TextFile::new(rc).ensure_line(&line, &line)?.was_applied() {
                info!(status = "ok", path = %rc.display(), folder, "added folder to PATH");
                report.updated.push(target);
            } else {
                report.already_present.push(target);
            }
        }

        Ok(report)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
