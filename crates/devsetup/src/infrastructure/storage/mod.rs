//! Storage infrastructure: configuration file persistence.
//!
//! The `config` sub-module reads the TOML configuration file from the
//! platform-appropriate directory and supplies defaults when the file does
//! not exist yet (first run).  The configuration stores that devsetup *edits*
//! (VS Code settings, rc files, the registry) live in `devsetup_core`.

pub mod config;
