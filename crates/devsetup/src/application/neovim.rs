//! Neovim bundle: the editor itself plus the VS Code integration.
//!
//! On Windows the pinned release zip is unpacked into `~/nvim` and its `bin`
//! folder is put on the persistent PATH; the PATH store hands back an
//! environment patch so the rest of this run can already see `nvim`.  On
//! Linux the distribution package is used.

use devsetup_core::store::record_list::KEYBINDING_IDENTITY;
use serde_json::{json, Map, Value};
use tracing::info;

use super::bundle::{install_required, log_outcome, Bundle, BundleError, StepExt};
use super::packages::KnownPackage;
use super::platform::{Os, Platform};

/// VS Code extension embedding Neovim as the editor backend.
pub const VSCODE_NEOVIM_EXTENSION: &str = "asvetliakov.vscode-neovim";

/// Default Windows release archive.
pub const DEFAULT_WINDOWS_URL: &str =
    "https://github.com/neovim/neovim/releases/download/v0.11.5/nvim-win64.zip";

/// Tunables of the neovim bundle, filled from the `[neovim]` config table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeovimOptions {
    pub windows_url: String,
}

impl Default for NeovimOptions {
    fn default() -> Self {
        Self {
            windows_url: DEFAULT_WINDOWS_URL.to_string(),
        }
    }
}

pub struct NeovimBundle {
    options: NeovimOptions,
}

impl NeovimBundle {
    pub fn new(options: NeovimOptions) -> Self {
        Self { options }
    }

    /// Keybinding that removes vscode-neovim's `ctrl+k` so VS Code's own
    /// `ctrl+k` chords keep working in the editor.
    pub fn ctrl_k_keybinding() -> Map<String, Value> {
        let mut record = Map::new();
        record.insert("key".into(), json!("ctrl+k"));
        record.insert("command".into(), json!("-vscode-neovim.send"));
        record.insert("when".into(), json!("editorTextFocus && neovim.init"));
        record
    }

    fn install_windows_release(&self, platform: &dyn Platform) -> Result<(), BundleError> {
        let archive = platform.work_dir().join("nvim.zip");
        let install_dir = platform.home_dir().join("nvim");

        info!("Downloading {}...", self.options.windows_url);
        platform
            .download(&self.options.windows_url, &archive)
            .step("download Neovim")?;

        info!("Extracting...");
        platform
            .extract_archive(&archive, &install_dir)
            .step("extract Neovim")?;

        // The archive contains a single `nvim-win64` folder.
        let bin = install_dir.join("nvim-win64").join("bin");
        let bin = bin.to_string_lossy();
        info!("Adding {bin} to PATH...");
        let report = platform
            .path_store()
            .ensure_folder_on_path(&bin)
            .step("add Neovim to PATH")?;
        if let Some(patch) = &report.env_patch {
            platform.apply_environment_patch(patch);
        }
        if !report.changed() {
            info!("'{bin}' is already in the PATH.");
        }

        info!(status = "ok", "Successfully installed Neovim binary");
        Ok(())
    }
}

impl Bundle for NeovimBundle {
    fn name(&self) -> &'static str {
        "neovim"
    }

    fn install(&self, platform: &dyn Platform) -> Result<(), BundleError> {
        info!("Installing Neovim...");
        match platform.os() {
            Os::Windows => self.install_windows_release(platform)?,
            Os::Linux => {
                install_required(platform, KnownPackage::Neovim)?;
            }
        }

        info!("Installing VS Code Neovim extension...");
        let outcome = platform
            .install_vscode_extension(VSCODE_NEOVIM_EXTENSION)
            .step("install VS Code Neovim extension")?;
        log_outcome(VSCODE_NEOVIM_EXTENSION, outcome);

        let added = platform
            .vscode_keybindings()
            .append(Self::ctrl_k_keybinding(), KEYBINDING_IDENTITY)
            .step("add ctrl+k keybinding")?;
        if added.was_applied() {
            info!(status = "ok", "Added ctrl+k keybinding for VS Code Neovim");
        }
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::platform::mock::MockPlatform;
    use std::fs;

    #[test]
    fn test_linux_installs_package_extension_and_keybinding() {
        // Arrange
        let platform = MockPlatform::new(Os::Linux);

        // Act
        NeovimBundle::new(NeovimOptions::default())
            .install(&platform)
            .unwrap();

        // Assert
        assert_eq!(platform.installed_packages(), vec![KnownPackage::Neovim]);
        assert_eq!(platform.installed_extensions(), vec![VSCODE_NEOVIM_EXTENSION]);
        let bindings: Value =
            serde_json::from_str(&fs::read_to_string(platform.keybindings_path()).unwrap())
                .unwrap();
        assert_eq!(bindings, json!([NeovimBundle::ctrl_k_keybinding()]));
        assert!(platform.downloads().is_empty());
    }

    #[test]
    fn test_windows_downloads_extracts_and_patches_path() {
        // Arrange
        let platform = MockPlatform::new(Os::Windows);
        let bin = platform.home_dir().join("nvim").join("nvim-win64").join("bin");

        // Act
        NeovimBundle::new(NeovimOptions::default())
            .install(&platform)
            .unwrap();

        // Assert
        assert_eq!(platform.downloads()[0].0, DEFAULT_WINDOWS_URL);
        assert_eq!(platform.extractions()[0].1, platform.home_dir().join("nvim"));
        let path = platform.registry_path().unwrap();
        assert!(path.contains(&*bin.to_string_lossy()));
        let patches = platform.env_patches();
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].append, bin.to_string_lossy());
        assert!(platform.installed_packages().is_empty());
    }

    #[test]
    fn test_second_windows_run_adds_no_path_entry_or_patch() {
        let platform = MockPlatform::new(Os::Windows);
        let bundle = NeovimBundle::new(NeovimOptions::default());
        bundle.install(&platform).unwrap();
        let path_after_first = platform.registry_path();

        bundle.install(&platform).unwrap();

        assert_eq!(platform.registry_path(), path_after_first);
        assert_eq!(platform.env_patches().len(), 1);
        let bindings = fs::read_to_string(platform.keybindings_path()).unwrap();
        assert_eq!(bindings.matches("ctrl+k").count(), 1);
    }

    #[test]
    fn test_download_failure_stops_before_extension() {
        let platform = MockPlatform::new(Os::Windows).failing_downloads();

        let err = NeovimBundle::new(NeovimOptions::default())
            .install(&platform)
            .unwrap_err();

        assert_eq!(err.step, "download Neovim");
        assert!(platform.installed_extensions().is_empty());
    }
}
