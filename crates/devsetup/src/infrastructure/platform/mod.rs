//! Concrete [`Platform`] implementations.
//!
//! The correct implementation is selected at compile time via
//! `#[cfg(target_os = ...)]` and constructed by [`native_platform`]:
//!
//! | Module    | OS      | Packages          | Persistent PATH       |
//! |-----------|---------|-------------------|-----------------------|
//! | `windows` | Windows | winget            | `HKCU\Environment`    |
//! | `linux`   | Linux   | apt or pacman     | `~/.bashrc`, `~/.zshrc` |
//!
//! `mock::MockPlatform` is compiled for unit tests and, with the `mock`
//! feature, for the integration tests under `tests/`.  It is not part of
//! the shipped binary.

use std::path::PathBuf;

use crate::application::platform::{Platform, PlatformError};

#[cfg(any(test, feature = "mock"))]
pub mod mock;

#[cfg(target_os = "linux")]
pub mod linux;

#[cfg(target_os = "windows")]
pub mod windows;

/// Name of the scratch directory created under the system temp directory.
const WORK_DIR_NAME: &str = "devsetup";

/// Builds the platform for the OS this binary was compiled for.
///
/// # Errors
///
/// Returns [`PlatformError::UnsupportedOs`] on any OS other than Windows and
/// Linux, or [`PlatformError::MissingEnvironment`] if the home directory
/// cannot be determined.
pub fn native_platform() -> Result<Box<dyn Platform>, PlatformError> {
    #[cfg(target_os = "linux")]
    {
        Ok(Box::new(linux::LinuxPlatform::new()?))
    }

    #[cfg(target_os = "windows")]
    {
        Ok(Box::new(windows::WindowsPlatform::new()?))
    }

    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    {
        Err(PlatformError::UnsupportedOs(std::env::consts::OS.to_string()))
    }
}

/// The user's home directory: `$HOME`, falling back to `%USERPROFILE%`.
///
/// # Errors
///
/// Returns [`PlatformError::MissingEnvironment`] if neither is set.
pub fn home_dir() -> Result<PathBuf, PlatformError> {
    std::env::var_os("HOME")
        .filter(|h| !h.is_empty())
        .or_else(|| std::env::var_os("USERPROFILE").filter(|h| !h.is_empty()))
        .map(PathBuf::from)
        .ok_or(PlatformError::MissingEnvironment("HOME"))
}

/// Scratch directory for downloaded archives.
pub fn work_dir() -> PathBuf {
    std::env::temp_dir().join(WORK_DIR_NAME)
}
