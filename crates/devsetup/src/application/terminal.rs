//! Terminal bundle: shell, prompt engine, Nerd Font and editor integration.
//!
//! # Steps (for beginners)
//!
//! | Step                         | Windows                               | Linux                          | On failure |
//! |------------------------------|---------------------------------------|--------------------------------|------------|
//! | Shell                        | PowerShell, WT default profile, `.lnk`| zsh, login-shell advice        | stop       |
//! | Prompt engine                | Oh-My-Posh via winget                 | Oh-My-Posh install script      | stop       |
//! | Font                         | extract, user installs by hand        | `~/.local/share/fonts`         | continue   |
//! | VS Code terminal settings    | `defaultProfile.windows`, font        | `defaultProfile.linux`, font   | continue   |
//! | Prompt init line             | `$PROFILE`                            | `~/.zshrc`                     | continue   |
//! | Terminal emulator settings   | WT font face and color schemes        | (none)                         | continue   |
//!
//! Every configuration step goes through an idempotent store, so running the
//! bundle again leaves every file as it is.

use serde_json::{json, Map, Value};
use tracing::{info, warn};

use super::bundle::{install_required, Bundle, BundleError, StepExt};
use super::packages::KnownPackage;
use super::platform::{FontInstall, Os, Platform, ShellStatus, Shortcut};

/// Fragment identifying an existing PowerShell prompt init line.
pub const PWSH_INIT_FRAGMENT: &str = "oh-my-posh init pwsh";
/// Fragment identifying an existing zsh prompt init line.
pub const ZSH_INIT_FRAGMENT: &str = "oh-my-posh init zsh";

/// Archive name used for the downloaded font release.
const FONT_ARCHIVE: &str = "CascadiaCode.zip";

/// Tunables of the terminal bundle, filled from the `[terminal]` config table.
#[derive(Debug, Clone, PartialEq)]
pub struct TerminalOptions {
    /// Font family written to VS Code and Windows Terminal.
    pub font_face: String,
    /// Release zip containing the font files.
    pub font_url: String,
    /// Oh-My-Posh theme passed to `oh-my-posh init`.
    pub prompt_theme_url: String,
    /// Color scheme selected for all Windows Terminal profiles; empty leaves
    /// the current choice alone.
    pub color_scheme: String,
    /// Windows Terminal color schemes, merged by `name`.
    pub schemes: Vec<Map<String, Value>>,
}

pub struct TerminalBundle {
    options: TerminalOptions,
}

impl TerminalBundle {
    pub fn new(options: TerminalOptions) -> Self {
        Self { options }
    }

    /// The line appended to the shell profile on `os`, with the fragment
    /// that marks it as present.
    pub fn prompt_init_line(&self, os: Os) -> (&'static str, String) {
        let theme = &self.options.prompt_theme_url;
        match os {
            Os::Windows => (
                PWSH_INIT_FRAGMENT,
                format!("{PWSH_INIT_FRAGMENT} --config \"{theme}\" | Invoke-Expression"),
            ),
            Os::Linux => (
                ZSH_INIT_FRAGMENT,
                format!("eval \"$({ZSH_INIT_FRAGMENT} --config {theme})\""),
            ),
        }
    }

    /// Deep-merge update for the terminal emulator's settings document.
    pub fn terminal_updates(&self) -> Map<String, Value> {
        let mut defaults = Map::new();
        defaults.insert("font".into(), json!({ "face": self.options.font_face }));
        if !self.options.color_scheme.is_empty() {
            defaults.insert("colorScheme".into(), json!(self.options.color_scheme));
        }

        let mut updates = Map::new();
        updates.insert("profiles".into(), json!({ "defaults": defaults }));
        if !self.options.schemes.is_empty() {
            let schemes = self.options.schemes.iter().cloned().map(Value::Object).collect();
            updates.insert("schemes".into(), Value::Array(schemes));
        }
        updates
    }

    // ── Shell ─────────────────────────────────────────────────────────────────

    fn install_shell(&self, platform: &dyn Platform) -> Result<(), BundleError> {
        match platform.os() {
            Os::Windows => self.install_powershell(platform),
            Os::Linux => self.install_zsh(platform),
        }
    }

    fn install_powershell(&self, platform: &dyn Platform) -> Result<(), BundleError> {
        install_required(platform, KnownPackage::PowerShell)?;

        let emulator = platform.terminal_emulator();
        match emulator.and_then(|t| t.settings()) {
            Some(settings) => {
                let mut updates = Map::new();
                updates.insert("defaultProfile".into(), json!("PowerShell"));
                if settings
                    .apply(updates)
                    .or_log("set Windows Terminal default profile")
                    .is_some()
                {
                    info!(status = "ok", "PowerShell is the Windows Terminal default profile");
                }
            }
            None => warn!("Could not find Windows Terminal settings."),
        }

        info!("Creating Windows Terminal shortcut...");
        let target = emulator
            .and_then(|t| t.executable())
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| "wt.exe".into());
        let shortcut = Shortcut {
            name: "Windows Terminal".to_string(),
            target,
            description: "Windows Terminal".to_string(),
            hotkey: Some("CTRL+ALT+T".to_string()),
        };
        if let Some(path) = platform
            .create_shortcut(&shortcut)
            .or_log("create Windows Terminal shortcut")
        {
            info!(status = "ok", "Shortcut created at '{}' with hotkey 'CTRL+ALT+T'", path.display());
        }
        Ok(())
    }

    fn install_zsh(&self, platform: &dyn Platform) -> Result<(), BundleError> {
        install_required(platform, KnownPackage::Zsh)?;

        match platform
            .default_shell_status("zsh")
            .or_log("check default shell")
        {
            Some(ShellStatus::IsDefault) => info!(status = "ok", "Zsh is the default shell"),
            Some(ShellStatus::NotDefault { path }) => info!(
                "Please run 'chsh -s {}' manually to make zsh the default shell.",
                path.display()
            ),
            None => {}
        }
        Ok(())
    }

    // ── Font ──────────────────────────────────────────────────────────────────

    fn install_font(&self, platform: &dyn Platform) {
        info!("Installing font ({})...", self.options.font_face);
        let archive = platform.work_dir().join(FONT_ARCHIVE);

        info!("Downloading font from {}...", self.options.font_url);
        let result = platform
            .download(&self.options.font_url, &archive)
            .and_then(|()| platform.install_fonts(&archive));
        if archive.exists() {
            if let Err(e) = std::fs::remove_file(&archive) {
                warn!("Could not remove {}: {e}", archive.display());
            }
        }

        match result.or_log("install font") {
            Some(FontInstall::Installed { dir }) => {
                info!(status = "ok", "Installed {} into {}", self.options.font_face, dir.display());
            }
            Some(FontInstall::ManualStepRequired { dir }) => {
                info!(
                    "Please install the fonts in '{}' manually (select all, right click, Install).",
                    dir.display()
                );
            }
            None => info!(
                "Skipping automatic font installation. Please install '{}' manually.",
                self.options.font_face
            ),
        }
    }

    // ── Configuration ─────────────────────────────────────────────────────────

    fn configure_vscode(&self, platform: &dyn Platform) {
        info!("Updating VS Code terminal settings...");
        let os = platform.os();
        let profile = match os {
            Os::Windows => "PowerShell",
            Os::Linux => "zsh",
        };
        let settings = vec![
            (
                format!("terminal.integrated.defaultProfile.{}", os.settings_suffix()),
                json!(profile),
            ),
            (
                "terminal.integrated.fontFamily".to_string(),
                json!(self.options.font_face),
            ),
        ];
        if let Some(report) = platform
            .vscode_settings()
            .apply_all(settings)
            .or_log("update VS Code terminal settings")
        {
            info!(
                status = "ok",
                changed = report.changed.len(),
                "VS Code terminal settings updated"
            );
        }
    }

    fn configure_prompt(&self, platform: &dyn Platform) {
        let Some(profile) = platform.shell_profile().or_log("locate shell profile") else {
            warn!("Skipping prompt configuration. Restart the terminal and run again.");
            return;
        };

        let (fragment, line) = self.prompt_init_line(platform.os());
        match profile.ensure_line(fragment, &line).or_log("configure shell profile") {
            Some(outcome) if outcome.was_applied() => {
                info!(status = "ok", "Added Oh-My-Posh init to the shell profile")
            }
            Some(_) => info!("Oh-My-Posh already configured in the shell profile"),
            None => {}
        }

        if platform.os() == Os::Linux {
            info!(
                "Note: set your terminal emulator font to '{}' manually.",
                self.options.font_face
            );
        }
    }

    fn configure_terminal_emulator(&self, platform: &dyn Platform) {
        let Some(emulator) = platform.terminal_emulator() else {
            return;
        };
        let Some(settings) = emulator.settings() else {
            warn!("Could not find {} settings.", emulator.name());
            return;
        };

        match settings
            .apply(self.terminal_updates())
            .or_log("update terminal emulator settings")
        {
            Some(outcome) if outcome.was_applied() => info!(
                status = "ok",
                "Updated {} default font to {}",
                emulator.name(),
                self.options.font_face
            ),
            Some(_) => info!("{} settings already up to date", emulator.name()),
            None => {}
        }
    }
}

impl Bundle for TerminalBundle {
    fn name(&self) -> &'static str {
        "terminal"
    }

    fn install(&self, platform: &dyn Platform) -> Result<(), BundleError> {
        self.install_shell(platform)?;
        install_required(platform, KnownPackage::OhMyPosh)?;
        self.install_font(platform);

        info!("Configuring shell...");
        self.configure_vscode(platform);
        self.configure_prompt(platform);
        self.configure_terminal_emulator(platform);

        info!(status = "ok", "Terminal setup completed successfully.");
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
