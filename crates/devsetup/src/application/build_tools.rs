//! Build-tools bundle: compiler toolchain, CMake and Ninja.
//!
//! The toolchain is WinLibs (MinGW-w64 GCC with LLVM/Clang) on Windows and
//! `build-essential` (GCC + Make) on Linux.

use tracing::info;

use super::bundle::{install_required, Bundle, BundleError};
use super::packages::KnownPackage;
use super::platform::Platform;

/// Packages installed by [`BuildToolsBundle`], in order.
pub const BUILD_TOOLS: &[KnownPackage] = &[
    KnownPackage::GccToolchain,
    KnownPackage::CMake,
    KnownPackage::Ninja,
];

pub struct BuildToolsBundle;

impl Bundle for BuildToolsBundle {
    fn name(&self) -> &'static str {
        "build-tools"
    }

    fn install(&self, platform: &dyn Platform) -> Result<(), BundleError> {
        info!("Installing Build Tools (Compiler, CMake, Ninja)...");
        for &package in BUILD_TOOLS {
            install_required(platform, package)?;
        }
        info!(status = "ok", "Successfully installed build tools.");
        Ok(())
    }
}
