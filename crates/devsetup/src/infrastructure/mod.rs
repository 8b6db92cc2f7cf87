//! Infrastructure layer: OS-facing adapters.
//!
//! Contains the concrete platforms (winget and the registry on Windows,
//! apt/pacman and rc files on Linux), external process execution, HTTP
//! downloads, zip unpacking, and configuration file storage.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `devsetup_core`, but MUST NOT be imported by the `application` layer
//! outside of its tests.

pub mod archive;
pub mod download;
pub mod platform;
pub mod process;
pub mod storage;
