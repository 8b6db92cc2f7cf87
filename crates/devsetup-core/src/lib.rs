//! # devsetup-core
//!
//! The idempotent configuration-apply engine behind `devsetup`.
//!
//! This crate knows how to bring a configuration *store* (a JSON settings
//! file, a JSON keybindings array, a shell rc file, the persistent PATH, a
//! terminal-emulator settings document) into a desired state without
//! clobbering unrelated content and without duplicating entries when the
//! whole bootstrap is run again.
//!
//! It has zero dependencies on process spawning, network access, or platform
//! APIs.  Platform specifics (which file, which registry value) are supplied
//! by the `devsetup` crate; everything here works on explicit paths or on an
//! injected [`store::path::UserEnvironment`].
//!
//! # Architecture overview (for beginners)
//!
//! - **`jsonc`** – Reads "JSON with comments", the dialect VS Code and
//!   Windows Terminal write into their settings files.
//!
//! - **`merge`** – Pure algorithms on `serde_json` values: identity lookup in
//!   record lists, name-keyed list merge, and recursive object merge.
//!
//! - **`file`** – Load/save helpers shared by every file-backed store.  Saves
//!   go through a temporary file and a rename so a crash never leaves a
//!   truncated store behind.
//!
//! - **`store`** – The store contracts (one trait per store family) and their
//!   file-backed implementations.
//!
//! Every store operation is a blocking load → mutate → save cycle.  Nothing is
//! cached between calls.

pub mod error;
pub mod file;
pub mod jsonc;
pub mod merge;
pub mod store;

// Re-export the most-used types at the crate root so callers can write
// `devsetup_core::StoreError` instead of `devsetup_core::error::StoreError`.
pub use error::StoreError;
pub use jsonc::{strip_comments, JsoncError};
pub use store::path::{
    EnvironmentPatch, MemoryEnvironment, PathReport, PathTarget, RegistryPathStore,
    ShellRcPathStore, UserEnvironment,
};
pub use store::record_list::JsonRecordList;
pub use store::settings::{JsonSettingsFile, SettingsReport};
pub use store::terminal::TerminalSettingsFile;
pub use store::text::TextFile;
pub use store::{
    ApplyOutcome, DeepMergeStore, KeyValueStore, PathStore, RecordListStore, TextAppendStore,
};
