//! Baseline bundle: Git plus the default VS Code extensions.  Always runs.

use tracing::info;

use super::bundle::{install_required, log_outcome, Bundle, BundleError, StepExt};
use super::packages::KnownPackage;
use super::platform::Platform;

/// Extensions installed when the configuration does not list any.
pub const DEFAULT_EXTENSIONS: &[&str] = &["tomphilbin.gruvbox-themes", "s-nlf-fh.glassit"];

pub struct BaselineBundle {
    extensions: Vec<String>,
}

impl BaselineBundle {
    pub fn new(extensions: Vec<String>) -> Self {
        Self { extensions }
    }
}

impl Default for BaselineBundle {
    fn default() -> Self {
        Self::new(DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect())
    }
}

impl Bundle for BaselineBundle {
    fn name(&self) -> &'static str {
        "baseline"
    }

    fn install(&self, platform: &dyn Platform) -> Result<(), BundleError> {
        install_required(platform, KnownPackage::Git)?;

        info!("Installing VS Code extensions...");
        for extension in &self.extensions {
            let outcome = platform
                .install_vscode_extension(extension)
                .step(&format!("install VS Code extension {extension}"))?;
            log_outcome(extension, outcome);
        }
        info!(status = "ok", "Successfully installed VS Code extensions");
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
