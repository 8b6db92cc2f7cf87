//! devsetup library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does devsetup do? (for beginners)
//!
//! devsetup bootstraps a developer workstation.  Every run:
//!
//! 1. Installs the baseline (Git and a list of VS Code extensions).
//! 2. Runs each optional bundle selected on the command line: terminal
//!    (shell, prompt, font, terminal settings), Neovim, build tools, and
//!    utilities.
//! 3. Edits configuration files through the `devsetup_core` stores, which
//!    merge instead of overwrite and never add an entry twice.
//!
//! Running devsetup again is safe: packages that are already installed are
//! reported as such, and the configuration files end up byte-identical.

/// Application layer: bundles, the orchestrator and the platform contract.
pub mod application;

/// Infrastructure layer: platforms, processes, downloads and config.
pub mod infrastructure;
