//! TOML-based configuration for devsetup.
//!
//! Reads `AppConfig` from the platform-appropriate config file:
//! - Windows:  `%APPDATA%\devsetup\devsetup.toml`
//! - Linux:    `$XDG_CONFIG_HOME/devsetup/devsetup.toml` (or `~/.config/...`)
//!
//! `--config <path>` (or `DEVSETUP_CONFIG`) points at a different file.
//!
//! # What can be configured? (for beginners)
//!
//! Every key is optional; a missing file means "all defaults".  Example:
//!
//! ```toml
//! log_level = "debug"
//!
//! [vscode]
//! extensions = ["tomphilbin.gruvbox-themes", "rust-lang.rust-analyzer"]
//!
//! [terminal]
//! font_face = "Cascadia Mono NF"
//! color_scheme = "Gruvbox Dark"
//!
//! [[terminal.schemes]]
//! name = "Gruvbox Dark"
//! background = "#282828"
//! foreground = "#EBDBB2"
//!
//! [neovim]
//! windows_url = "https://github.com/neovim/neovim/releases/download/v0.11.5/nvim-win64.zip"
//! ```
//!
//! # Serde default values
//!
//! Fields annotated with `#[serde(default = "some_fn")]` use the return value
//! of `some_fn()` when the field is absent, so a config file only needs the
//! keys the user wants to change.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::application::baseline::DEFAULT_EXTENSIONS;
use crate::application::neovim::{NeovimOptions, DEFAULT_WINDOWS_URL};
use crate::application::orchestrator::BundleOptions;
use crate::application::terminal::TerminalOptions;

/// File name of the configuration file inside the config directory.
pub const CONFIG_FILE_NAME: &str = "devsetup.toml";

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    /// `tracing` filter used when `RUST_LOG` is unset: `"error"`, `"warn"`,
    /// `"info"`, `"debug"`, `"trace"` or a full directive string.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub vscode: VsCodeConfig,
    #[serde(default)]
    pub terminal: TerminalConfig,
    #[serde(default)]
    pub neovim: NeovimConfig,
}

/// `[vscode]` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VsCodeConfig {
    /// Extensions installed by the baseline bundle.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

/// `[terminal]` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TerminalConfig {
    #[serde(default = "default_font_face")]
    pub font_face: String,
    #[serde(default = "default_font_url")]
    pub font_url: String,
    #[serde(default = "default_prompt_theme_url")]
    pub prompt_theme_url: String,
    /// Scheme selected for all Windows Terminal profiles.  Set to `""` to
    /// keep the user's choice.
    #[serde(default = "default_color_scheme")]
    pub color_scheme: String,
    /// Windows Terminal color schemes merged by `name`.
    #[serde(default = "default_schemes")]
    pub schemes: Vec<Map<String, Value>>,
}

/// `[neovim]` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NeovimConfig {
    /// Release archive downloaded on Windows.
    #[serde(default = "default_windows_url")]
    pub windows_url: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_extensions() -> Vec<String> {
    DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect()
}
fn default_font_face() -> String {
    "Cascadia Mono NF".to_string()
}
fn default_font_url() -> String {
    "https://github.com/microsoft/cascadia-code/releases/download/v2407.24/CascadiaCode-2407.24.zip"
        .to_string()
}
fn default_prompt_theme_url() -> String {
    "https://raw.githubusercontent.com/JanDeDobbeleer/oh-my-posh/main/themes/gruvbox.omp.json"
        .to_string()
}
fn default_color_scheme() -> String {
    "Gruvbox Dark".to_string()
}
fn default_windows_url() -> String {
    DEFAULT_WINDOWS_URL.to_string()
}

/// The Gruvbox Dark palette in Windows Terminal's scheme format.
fn default_schemes() -> Vec<Map<String, Value>> {
    let scheme = json!({
        "name": "Gruvbox Dark",
        "background": "#282828",
        "foreground": "#EBDBB2",
        "cursorColor": "#EBDBB2",
        "selectionBackground": "#665C54",
        "black": "#282828",
        "red": "#CC241D",
        "green": "#98971A",
        "yellow": "#D79921",
        "blue": "#458588",
        "purple": "#B16286",
        "cyan": "#689D6A",
        "white": "#A89984",
        "brightBlack": "#928374",
        "brightRed": "#FB4934",
        "brightGreen": "#B8BB26",
        "brightYellow": "#FABD2F",
        "brightBlue": "#83A598",
        "brightPurple": "#D3869B",
        "brightCyan": "#8EC07C",
        "brightWhite": "#EBDBB2"
    });
    match scheme {
        Value::Object(map) => vec![map],
        _ => Vec::new(),
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            vscode: VsCodeConfig::default(),
            terminal: TerminalConfig::default(),
            neovim: NeovimConfig::default(),
        }
    }
}

impl Default for VsCodeConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
        }
    }
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            font_face: default_font_face(),
            font_url: default_font_url(),
            prompt_theme_url: default_prompt_theme_url(),
            color_scheme: default_color_scheme(),
            schemes: default_schemes(),
        }
    }
}

impl Default for NeovimConfig {
    fn default() -> Self {
        Self {
            windows_url: default_windows_url(),
        }
    }
}

// ── Conversion into bundle options ────────────────────────────────────────────

impl From<TerminalConfig> for TerminalOptions {
    fn from(c: TerminalConfig) -> Self {
        Self {
            font_face: c.font_face,
            font_url: c.font_url,
            prompt_theme_url: c.prompt_theme_url,
            color_scheme: c.color_scheme,
            schemes: c.schemes,
        }
    }
}

impl From<NeovimConfig> for NeovimOptions {
    fn from(c: NeovimConfig) -> Self {
        Self {
            windows_url: c.windows_url,
        }
    }
}

impl AppConfig {
    /// Options for every bundle.
    pub fn bundle_options(&self) -> BundleOptions {
        BundleOptions {
            extensions: self.vscode.extensions.clone(),
            terminal: self.terminal.clone().into(),
            neovim: self.neovim.clone().into(),
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the default config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Loads `AppConfig` from `path`, or from [`config_file_path`] when `path` is
/// `None`.  A missing file yields `AppConfig::default()`.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => config_file_path()?,
    };

    match std::fs::read_to_string(&path) {
        Ok(content) => toml::from_str(&content).map_err(|source| ConfigError::Parse { path, source }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(ConfigError::Io { path, source: e }),
    }
}

/// Resolves the platform config base directory plus the `devsetup` subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        // %APPDATA% e.g. C:\Users\<user>\AppData\Roaming
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("devsetup"))
    }

    #[cfg(not(target_os = "windows"))]
    {
        // XDG_CONFIG_HOME or ~/.config
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("devsetup"))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    // ── AppConfig defaults ────────────────────────────────────────────────────

    #[test]
    fn test_app_config_default_log_level_is_info() {
        assert_eq!(AppConfig::default().log_level, "info");
    }

    #[test]
    fn test_app_config_default_extensions() {
        let cfg = AppConfig::default();
        assert_eq!(
            cfg.vscode.extensions,
            vec!["tomphilbin.gruvbox-themes", "s-nlf-fh.glassit"]
        );
    }

    #[test]
    fn test_default_scheme_is_named_like_color_scheme() {
        let cfg = TerminalConfig::default();
        assert_eq!(cfg.schemes.len(), 1);
        assert_eq!(cfg.schemes[0]["name"], json!(cfg.color_scheme));
    }

    // ── Loading ───────────────────────────────────────────────────────────────

    #[test]
    fn test_load_config_missing_file_returns_defaults() {
        let dir = TempDir::new().unwrap();
        let cfg = load_config(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn test_load_config_partial_file_keeps_other_defaults() {
        // Arrange
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(
            &path,
            "log_level = \"debug\"\n\n[terminal]\nfont_face = \"JetBrainsMono NF\"\n",
        )
        .unwrap();

        // Act
        let cfg = load_config(Some(&path)).unwrap();

        // Assert
        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.terminal.font_face, "JetBrainsMono NF");
        assert_eq!(cfg.terminal.font_url, default_font_url());
        assert_eq!(cfg.vscode, VsCodeConfig::default());
        assert_eq!(cfg.neovim, NeovimConfig::default());
    }

    #[test]
    fn test_load_config_reads_scheme_tables() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(
            &path,
            "[[terminal.schemes]]\nname = \"Nord\"\nbackground = \"#2E3440\"\n",
        )
        .unwrap();

        let cfg = load_config(Some(&path)).unwrap();

        assert_eq!(cfg.terminal.schemes.len(), 1);
        assert_eq!(cfg.terminal.schemes[0]["name"], json!("Nord"));
        assert_eq!(cfg.terminal.schemes[0]["background"], json!("#2E3440"));
    }

    #[test]
    fn test_load_config_malformed_toml_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "log_level = ").unwrap();

        let err = load_config(Some(&path)).unwrap_err();

        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_bundle_options_follow_config() {
        let mut cfg = AppConfig::default();
        cfg.vscode.extensions = vec!["a.b".to_string()];
        cfg.neovim.windows_url = "https://example.test/nvim.zip".to_string();

        let options = cfg.bundle_options();

        assert_eq!(options.extensions, vec!["a.b"]);
        assert_eq!(options.neovim.windows_url, "https://example.test/nvim.zip");
        assert_eq!(options.terminal.font_face, "Cascadia Mono NF");
    }

    #[test]
    fn test_config_serializes_and_deserializes_round_trip() {
        let mut cfg = AppConfig::default();
        cfg.terminal.color_scheme = String::new();

        let text = toml::to_string_pretty(&cfg).unwrap();
        let restored: AppConfig = toml::from_str(&text).unwrap();

        assert_eq!(restored, cfg);
    }
}
