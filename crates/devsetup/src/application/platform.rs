//! The platform capability contract the bundles are written against.
//!
//! # Why a trait? (for beginners)
//!
//! A bundle such as "terminal" needs to install packages, locate VS Code's
//! settings file and edit the persistent PATH.  *How* each of those happens
//! depends on the OS: winget and the registry on Windows, apt/pacman and rc
//! files on Linux.  The bundles only see [`Platform`]; the concrete
//! implementations live in `infrastructure::platform` and are chosen once at
//! start-up.  Tests use `MockPlatform`, which records every call.
//!
//! Optional capabilities are typed as `Option`: a platform without Windows
//! Terminal simply returns `None` from [`Platform::terminal_emulator`]
//! instead of having callers probe for a method at runtime.

use std::fmt;
use std::path::{Path, PathBuf};

use devsetup_core::{
    DeepMergeStore, EnvironmentPatch, KeyValueStore, PathStore, RecordListStore, StoreError,
    TextAppendStore,
};
use thiserror::Error;

use super::packages::KnownPackage;

/// Operating systems devsetup supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
    Windows,
    Linux,
}

impl Os {
    /// Suffix VS Code uses in per-OS setting keys
    /// (`terminal.integrated.defaultProfile.<suffix>`).
    pub fn settings_suffix(self) -> &'static str {
        match self {
            Os::Windows => "windows",
            Os::Linux => "linux",
        }
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Os::Windows => f.write_str("Windows"),
            Os::Linux => f.write_str("Linux"),
        }
    }
}

/// Successful result of an external installer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// The command ran and exited with status 0.
    Success,
    /// The command reported, through a known exit code or a pre-check, that
    /// nothing needed doing.
    AlreadySatisfied,
}

/// Error type for platform operations.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// The current OS is not one devsetup supports.
    #[error("OS {0} not supported")]
    UnsupportedOs(String),

    /// The operation has no implementation on this OS.
    #[error("{operation} is not supported on {os}")]
    Unsupported { operation: &'static str, os: Os },

    /// The package catalog has no source for this package on this OS.
    #[error("{package} is not available on {os}")]
    PackageUnavailable { package: KnownPackage, os: Os },

    /// A required executable is not on PATH.
    #[error("required tool `{0}` was not found on PATH")]
    ToolMissing(String),

    /// A required environment variable is unset.
    #[error("environment variable {0} is not set")]
    MissingEnvironment(&'static str),

    /// An external command failed to start or exited unsuccessfully.
    #[error("{0}")]
    Command(String),

    /// A download failed.
    #[error("{0}")]
    Download(String),

    /// A downloaded archive could not be unpacked.
    #[error("cannot unpack {path}: {reason}")]
    Archive { path: PathBuf, reason: String },

    /// A configuration store operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A file-system operation outside the stores failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A launcher entry (Start-menu `.lnk` or XDG `.desktop` file).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortcut {
    /// File name of the entry without extension, e.g. `Windows Terminal`.
    pub name: String,
    /// Executable the entry launches.
    pub target: PathBuf,
    pub description: String,
    /// Global hotkey such as `CTRL+ALT+T`, where the platform supports it.
    pub hotkey: Option<String>,
}

/// Whether a shell is the user's login shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellStatus {
    IsDefault,
    /// The shell is installed at `path` but another shell is the default.
    NotDefault { path: PathBuf },
}

/// What a font installation achieved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontInstall {
    /// Fonts were copied to `dir` and registered.
    Installed { dir: PathBuf },
    /// Fonts were extracted to `dir`; the user has to install them by hand.
    ManualStepRequired { dir: PathBuf },
}

/// A terminal emulator whose settings devsetup can edit (Windows Terminal).
pub trait TerminalEmulator {
    /// Display name used in log lines.
    fn name(&self) -> &str;

    /// The settings document, or `None` if the emulator has not created it
    /// yet (it does so on first launch).
    fn settings(&self) -> Option<&dyn DeepMergeStore>;

    /// Path of the emulator's executable, if it could be located.
    fn executable(&self) -> Option<&Path>;
}

/// Platform-specific stores and installers.
pub trait Platform {
    /// The OS this platform targets.
    fn os(&self) -> Os;

    /// The user's home directory.
    fn home_dir(&self) -> &Path;

    /// Scratch directory for downloads.
    fn work_dir(&self) -> &Path;

    /// VS Code user `settings.json`.
    fn vscode_settings(&self) -> &dyn KeyValueStore;

    /// VS Code user `keybindings.json`.
    fn vscode_keybindings(&self) -> &dyn RecordListStore;

    /// The persistent PATH.
    fn path_store(&self) -> &dyn PathStore;

    /// Applies an [`EnvironmentPatch`] returned by [`Platform::path_store`] to
    /// the running process.
    fn apply_environment_patch(&self, patch: &EnvironmentPatch);

    /// The init script of the shell the terminal bundle configures
    /// (PowerShell `$PROFILE` on Windows, `~/.zshrc` on Linux).
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::ToolMissing`] if the shell needed to resolve
    /// the profile location is not installed.
    fn shell_profile(&self) -> Result<Box<dyn TextAppendStore>, PlatformError>;

    /// The terminal emulator capability, if present on this machine.
    fn terminal_emulator(&self) -> Option<&dyn TerminalEmulator>;

    /// Installs `package` with the platform's package manager.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::PackageUnavailable`] if the package has no
    /// source on this OS, or [`PlatformError::Command`] if the installer
    /// fails.
    fn install_package(&self, package: KnownPackage) -> Result<ProcessOutcome, PlatformError>;

    /// Installs a VS Code extension through the `code` CLI.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::Command`] if `code` fails.
    fn install_vscode_extension(&self, extension_id: &str)
        -> Result<ProcessOutcome, PlatformError>;

    /// Creates a launcher entry and returns the path of the file written.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError`] if the entry cannot be written.
    fn create_shortcut(&self, shortcut: &Shortcut) -> Result<PathBuf, PlatformError>;

    /// Reports whether `shell` is the user's login shell.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::ToolMissing`] if `shell` is not installed, or
    /// [`PlatformError::Unsupported`] where login shells are not a concept.
    fn default_shell_status(&self, shell: &str) -> Result<ShellStatus, PlatformError>;

    /// Downloads `url` to `dest`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::Download`] on network or file errors.
    fn download(&self, url: &str, dest: &Path) -> Result<(), PlatformError>;

    /// Extracts a zip archive into `dest`.  An existing `dest` is removed
    /// first so stale files from an older release do not linger.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError`] if the archive cannot be extracted.
    fn extract_archive(&self, archive: &Path, dest: &Path) -> Result<(), PlatformError>;

    /// Installs the `.ttf`/`.otf` fonts contained in a zip archive.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError`] if extraction or registration fails.
    fn install_fonts(&self, archive: &Path) -> Result<FontInstall, PlatformError>;
}

// ── Tests ─────────────────────────────────────────────────────────────────────
