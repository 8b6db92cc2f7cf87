//! Utilities bundle: 7-Zip, Wget and KeePass.

use tracing::info;

use super::bundle::{install_required, Bundle, BundleError};
use super::packages::KnownPackage;
use super::platform::Platform;

/// Packages installed by [`UtilitiesBundle`], in order.
pub const UTILITIES: &[KnownPackage] = &[
    KnownPackage::SevenZip,
    KnownPackage::Wget,
    KnownPackage::KeePass,
];

pub struct UtilitiesBundle;

impl Bundle for UtilitiesBundle {
    fn name(&self) -> &'static str {
        "utils"
    }

    fn install(&self, platform: &dyn Platform) -> Result<(), BundleError> {
        info!("Installing Utilities (7zip, Wget, KeePass)...");
        for &package in UTILITIES {
            install_required(platform, package)?;
        }
        info!(status = "ok", "Successfully installed utilities.");
        Ok(())
    }
}
