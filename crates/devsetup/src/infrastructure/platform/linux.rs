//! Linux platform: apt or pacman, rc-file PATH, XDG locations.
//!
//! # Package managers
//!
//! The first of `apt` and `pacman` found on PATH is used, always through
//! `sudo`:
//!
//! ```text
//! sudo apt install -y <name>
//! sudo pacman -S --needed --noconfirm <name>
//! ```
//!
//! `--needed` makes pacman skip packages that are already up to date, so a
//! rerun does not reinstall everything.  apt is already a no-op for installed
//! packages.
//!
//! Packages without a distribution package (Oh-My-Posh) are installed with
//! their vendor install script, skipped when the binary is already present.
//!
//! # Files
//!
//! | What                 | Where                                       |
//! |----------------------|---------------------------------------------|
//! | VS Code settings     | `~/.config/Code/User/settings.json`         |
//! | VS Code keybindings  | `~/.config/Code/User/keybindings.json`      |
//! | Shell profile        | `~/.zshrc`                                  |
//! | Persistent PATH      | `~/.bashrc` and `~/.zshrc` (existing only)  |
//! | Fonts                | `~/.local/share/fonts`                      |
//! | Launchers            | `~/.local/share/applications/<name>.desktop`|
//!
//! Archives are unpacked in-process (see [`crate::infrastructure::archive`]);
//! only the font cache refresh runs an external command (`fc-cache`).

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use devsetup_core::{
    EnvironmentPatch, JsonRecordList, JsonSettingsFile, KeyValueStore, PathStore,
    RecordListStore, ShellRcPathStore, TextAppendStore, TextFile,
};
use tracing::{debug, info, warn};

use crate::application::packages::{KnownPackage, PackageSource};
use crate::application::platform::{
    FontInstall, Os, Platform, PlatformError, ProcessOutcome, Shortcut, ShellStatus,
    TerminalEmulator,
};
use crate::infrastructure::archive;
use crate::infrastructure::download::HttpDownloader;
use crate::infrastructure::process::{args, classify, run_checked, CommandRunner, SystemRunner};

/// A supported distribution package manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    Apt,
    Pacman,
}

impl PackageManager {
    /// Program name looked up on PATH.
    pub fn program(self) -> &'static str {
        match self {
            PackageManager::Apt => "apt",
            PackageManager::Pacman => "pacman",
        }
    }

    /// Arguments passed to `sudo` to install `name`.
    pub fn install_args(self, name: &str) -> Vec<String> {
        match self {
            PackageManager::Apt => args(["apt", "install", "-y", name]),
            PackageManager::Pacman => args(["pacman", "-S", "--needed", "--noconfirm", name]),
        }
    }
}

/// Contents of an XDG `.desktop` launcher for `shortcut`.
pub fn desktop_entry(shortcut: &Shortcut) -> String {
    format!(
        "[Desktop Entry]\nType=Application\nName={}\nComment={}\nExec={}\nIcon={}\nTerminal=false\n",
        shortcut.name,
        shortcut.description,
        shortcut.target.display(),
        shortcut.target.display(),
    )
}

/// The Linux [`Platform`].
///
/// Generic over the [`CommandRunner`] so unit tests can substitute the
/// `mockall` mock.
pub struct LinuxPlatform<R: CommandRunner = SystemRunner> {
    home: PathBuf,
    work: PathBuf,
    /// Value of `$SHELL` at start-up.
    login_shell: String,
    settings: JsonSettingsFile,
    keybindings: JsonRecordList,
    path_store: ShellRcPathStore,
    runner: R,
    downloader: HttpDownloader,
}

impl LinuxPlatform<SystemRunner> {
    /// Creates the platform for the current user.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::MissingEnvironment`] if `$HOME` is unset.
    pub fn new() -> Result<Self, PlatformError> {
        let home = super::home_dir()?;
        let login_shell = std::env::var("SHELL").unwrap_or_default();
        Ok(Self::with_runner(SystemRunner, home, super::work_dir(), login_shell))
    }
}

impl<R: CommandRunner> LinuxPlatform<R> {
    /// Creates a platform rooted at `home` that runs commands through `runner`.
    pub fn with_runner(runner: R, home: PathBuf, work: PathBuf, login_shell: String) -> Self {
        let vscode_dir = home.join(".config").join("Code").join("User");
        Self {
            settings: JsonSettingsFile::new(vscode_dir.join("settings.json")),
            keybindings: JsonRecordList::new(vscode_dir.join("keybindings.json")),
            path_store: ShellRcPathStore::for_home(&home),
            home,
            work,
            login_shell,
            runner,
            downloader: HttpDownloader::new(),
        }
    }

    /// The first supported package manager on PATH.
    pub fn package_manager(&self) -> Option<PackageManager> {
        [PackageManager::Apt, PackageManager::Pacman]
            .into_iter()
            .find(|pm| self.runner.locate(pm.program()).is_some())
    }

    fn font_dir(&self) -> PathBuf {
        self.home.join(".local").join("share").join("fonts")
    }

    fn applications_dir(&self) -> PathBuf {
        self.home.join(".local").join("share").join("applications")
    }

    fn require(&self, program: &str) -> Result<PathBuf, PlatformError> {
        self.runner
            .locate(program)
            .ok_or_else(|| PlatformError::ToolMissing(program.to_string()))
    }

    fn install_with_manager(&self, name: &str) -> Result<ProcessOutcome, PlatformError> {
        let pm = self
            .package_manager()
            .ok_or_else(|| PlatformError::ToolMissing("apt or pacman".to_string()))?;
        info!("Installing {name} via {}...", pm.program());
        Ok(run_checked(&self.runner, "sudo", &pm.install_args(name), &[])?)
    }

    fn install_with_script(&self, url: &str, binary: &str) -> Result<ProcessOutcome, PlatformError> {
        if Path::new(binary).exists() {
            debug!(binary, "already installed");
            return Ok(ProcessOutcome::AlreadySatisfied);
        }
        info!("Downloading and installing via {url}...");
        let script = format!("curl -s {url} | sudo bash -s");
        Ok(run_checked(&self.runner, "sh", &args(["-c", script.as_str()]), &[])?)
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> PlatformError + '_ {
    move |source| PlatformError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl<R: CommandRunner> Platform for LinuxPlatform<R> {
    fn os(&self) -> Os {
        Os::Linux
    }

    fn home_dir(&self) -> &Path {
        &self.home
    }

    fn work_dir(&self) -> &Path {
        &self.work
    }

    fn vscode_settings(&self) -> &dyn KeyValueStore {
        &self.settings
    }

    fn vscode_keybindings(&self) -> &dyn RecordListStore {
        &self.keybindings
    }

    fn path_store(&self) -> &dyn PathStore {
        &self.path_store
    }

    fn apply_environment_patch(&self, patch: &EnvironmentPatch) {
        patch.apply();
    }

    fn shell_profile(&self) -> Result<Box<dyn TextAppendStore>, PlatformError> {
        Ok(Box::new(TextFile::new(self.home.join(".zshrc"))))
    }

    fn terminal_emulator(&self) -> Option<&dyn TerminalEmulator> {
        None
    }

    fn install_package(&self, package: KnownPackage) -> Result<ProcessOutcome, PlatformError> {
        match package.source(Os::Linux) {
            PackageSource::Manager(name) => self.install_with_manager(name),
            PackageSource::Script { url, binary } => self.install_with_script(url, binary),
            PackageSource::Unavailable => Err(PlatformError::PackageUnavailable {
                package,
                os: Os::Linux,
            }),
        }
    }

    fn install_vscode_extension(
        &self,
        extension_id: &str,
    ) -> Result<ProcessOutcome, PlatformError> {
        // The CLI prints a progress line per extension; keep it off the log.
        let output = self
            .runner
            .capture("code", &args(["--install-extension", extension_id]))?;
        Ok(classify("code", output.code, &[])?)
    }

    fn create_shortcut(&self, shortcut: &Shortcut) -> Result<PathBuf, PlatformError> {
        if shortcut.hotkey.is_some() {
            warn!("Hotkeys are not standard in .desktop files and might not work implicitly.");
        }
        let dir = self.applications_dir();
        fs::create_dir_all(&dir).map_err(io_error(&dir))?;

        let path = dir.join(format!("{}.desktop", shortcut.name));
        fs::write(&path, desktop_entry(shortcut)).map_err(io_error(&path))?;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).map_err(io_error(&path))?;
        Ok(path)
    }

    fn default_shell_status(&self, shell: &str) -> Result<ShellStatus, PlatformError> {
        let path = self.require(shell)?;
        if self.login_shell.contains(&*path.to_string_lossy()) {
            Ok(ShellStatus::IsDefault)
        } else {
            Ok(ShellStatus::NotDefault { path })
        }
    }

    fn download(&self, url: &str, dest: &Path) -> Result<(), PlatformError> {
        self.downloader.fetch(url, dest)?;
        Ok(())
    }

    fn extract_archive(&self, archive: &Path, dest: &Path) -> Result<(), PlatformError> {
        archive::extract_all(archive, dest)
    }

    fn install_fonts(&self, archive: &Path) -> Result<FontInstall, PlatformError> {
        let dir = self.font_dir();
        info!("Extracting to {}...", dir.display());
        let fonts = archive::extract_fonts(archive, &dir)?;
        debug!(count = fonts.len(), "font files written");

        info!("Updating font cache...");
        if self.runner.locate("fc-cache").is_some() {
            run_checked(&self.runner, "fc-cache", &args(["-f"]), &[])?;
        } else {
            warn!("fc-cache not found; new fonts appear after the next login.");
        }
        Ok(FontInstall::Installed { dir })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
