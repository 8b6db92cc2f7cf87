//! Recording platform for tests.
//!
//! # Why a mock platform?
//!
//! The real platforms install software system-wide, edit the registry and
//! download archives from the internet.  None of that belongs in a unit test.
//!
//! `MockPlatform` keeps the *file-backed* stores real (VS Code settings,
//! keybindings, shell profile, Windows Terminal settings) but points them
//! into a private temporary home directory, so tests can read the files the
//! bundles produced.  Everything else (package installs, extensions,
//! shortcuts, downloads, extraction, fonts, process-environment patches) is
//! recorded in `Mutex<Vec<...>>` fields that tests inspect afterwards.
//!
//! On Windows the persistent PATH lives in an in-memory
//! [`MemoryEnvironment`]; on Linux it is the real rc files under the
//! temporary home.
//!
//! Only compiled under `cfg(test)` or the `mock` feature; the builders panic
//! on temp-directory I/O failures, which is acceptable in a test fixture.
//!
//! # Usage in tests
//!
//! ```ignore
//! let platform = MockPlatform::new(Os::Linux).failing_package(KnownPackage::CMake);
//! let result = BuildToolsBundle.install(&platform);
//!
//! assert!(result.is_err());
//! assert_eq!(platform.installed_packages(), vec![KnownPackage::GccToolchain]);
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use devsetup_core::store::path::PATH_VARIABLE;
use devsetup_core::{
    DeepMergeStore, EnvironmentPatch, JsonRecordList, JsonSettingsFile, KeyValueStore,
    MemoryEnvironment, PathStore, RecordListStore, RegistryPathStore, ShellRcPathStore,
    TerminalSettingsFile, TextAppendStore, TextFile,
};
use tempfile::TempDir;

use crate::application::packages::{KnownPackage, PackageSource};
use crate::application::platform::{
    FontInstall, Os, Platform, PlatformError, ProcessOutcome, Shortcut, ShellStatus,
    TerminalEmulator,
};

/// Initial value of the in-memory user PATH on Windows.
const INITIAL_WINDOWS_PATH: &str = r"%USERPROFILE%\AppData\Local\Microsoft\WindowsApps";

enum MockPathStore {
    Registry(RegistryPathStore<MemoryEnvironment>),
    RcFiles(ShellRcPathStore),
}

struct MockTerminal {
    settings: TerminalSettingsFile,
}

impl TerminalEmulator for MockTerminal {
    fn name(&self) -> &str {
        "Windows Terminal"
    }

    fn settings(&self) -> Option<&dyn DeepMergeStore> {
        Some(&self.settings)
    }

    fn executable(&self) -> Option<&Path> {
        None
    }
}

/// A [`Platform`] that records calls instead of changing the machine.
pub struct MockPlatform {
    os: Os,
    // Owns the temporary directory; removed on drop.
    _root: TempDir,
    home: PathBuf,
    work: PathBuf,
    settings: JsonSettingsFile,
    keybindings: JsonRecordList,
    path_store: MockPathStore,
    terminal: Option<MockTerminal>,
    shell_profile_available: bool,
    failing_packages: Vec<KnownPackage>,
    failing_downloads: bool,

    installed_packages: Mutex<Vec<KnownPackage>>,
    installed_extensions: Mutex<Vec<String>>,
    shortcuts: Mutex<Vec<Shortcut>>,
    downloads: Mutex<Vec<(String, PathBuf)>>,
    extractions: Mutex<Vec<(PathBuf, PathBuf)>>,
    font_installs: Mutex<Vec<PathBuf>>,
    env_patches: Mutex<Vec<EnvironmentPatch>>,
}

/// Locks a recorder, recovering the data if a panicking test poisoned it.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockPlatform {
    /// Creates a mock for `os` with an empty temporary home directory.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    pub fn new(os: Os) -> Self {
        let root = TempDir::new().expect("create temporary directory for MockPlatform");
        let home = root.path().join("home");
        let work = root.path().join("work");

        let vscode_dir = match os {
            Os::Windows => home.join("AppData").join("Roaming").join("Code").join("User"),
            Os::Linux => home.join(".config").join("Code").join("User"),
        };
        let path_store = match os {
            Os::Windows => MockPathStore::Registry(RegistryPathStore::new(
                MemoryEnvironment::with_value(PATH_VARIABLE, INITIAL_WINDOWS_PATH),
            )),
            Os::Linux => MockPathStore::RcFiles(ShellRcPathStore::for_home(&home)),
        };

        Self {
            os,
            _root: root,
            settings: JsonSettingsFile::new(vscode_dir.join("settings.json")),
            keybindings: JsonRecordList::new(vscode_dir.join("keybindings.json")),
            path_store,
            terminal: None,
            shell_profile_available: true,
            failing_packages: Vec::new(),
            failing_downloads: false,
            home,
            work,
            installed_packages: Mutex::new(Vec::new()),
            installed_extensions: Mutex::new(Vec::new()),
            shortcuts: Mutex::new(Vec::new()),
            downloads: Mutex::new(Vec::new()),
            extractions: Mutex::new(Vec::new()),
            font_installs: Mutex::new(Vec::new()),
            env_patches: Mutex::new(Vec::new()),
        }
    }

    // ── Builders ──────────────────────────────────────────────────────────────

    /// Makes `install_package(package)` fail with a command error.
    pub fn failing_package(mut self, package: KnownPackage) -> Self {
        self.failing_packages.push(package);
        self
    }

    /// Makes every download fail.
    pub fn failing_downloads(mut self) -> Self {
        self.failing_downloads = true;
        self
    }

    /// Installs Windows Terminal with `content` as its settings file.
    ///
    /// # Panics
    ///
    /// Panics if the settings file cannot be written.
    pub fn with_terminal_settings(mut self, content: &str) -> Self {
        let path = self.terminal_settings_path();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).expect("create terminal settings directory");
        }
        fs::write(&path, content).expect("write terminal settings");
        self.terminal = Some(MockTerminal {
            settings: TerminalSettingsFile::new(path),
        });
        self
    }

    /// Simulates a shell whose profile location cannot be resolved.
    pub fn without_shell_profile(mut self) -> Self {
        self.shell_profile_available = false;
        self
    }

    // ── Recorded calls ────────────────────────────────────────────────────────

    pub fn installed_packages(&self) -> Vec<KnownPackage> {
        lock(&self.installed_packages).clone()
    }

    pub fn installed_extensions(&self) -> Vec<String> {
        lock(&self.installed_extensions).clone()
    }

    pub fn shortcuts(&self) -> Vec<Shortcut> {
        lock(&self.shortcuts).clone()
    }

    /// `(url, destination)` pairs.
    pub fn downloads(&self) -> Vec<(String, PathBuf)> {
        lock(&self.downloads).clone()
    }

    /// `(archive, destination)` pairs.
    pub fn extractions(&self) -> Vec<(PathBuf, PathBuf)> {
        lock(&self.extractions).clone()
    }

    /// Archives passed to `install_fonts`.
    pub fn font_installs(&self) -> Vec<PathBuf> {
        lock(&self.font_installs).clone()
    }

    pub fn env_patches(&self) -> Vec<EnvironmentPatch> {
        lock(&self.env_patches).clone()
    }

    // ── File locations ────────────────────────────────────────────────────────

    pub fn home_dir(&self) -> &Path {
        &self.home
    }

    pub fn settings_path(&self) -> &Path {
        self.settings.path()
    }

    pub fn keybindings_path(&self) -> &Path {
        self.keybindings.path()
    }

    /// The file [`Platform::shell_profile`] edits.
    pub fn profile_path(&self) -> PathBuf {
        match self.os {
            Os::Windows => self
                .home
                .join("Documents")
                .join("PowerShell")
                .join("Microsoft.PowerShell_profile.ps1"),
            Os::Linux => self.home.join(".zshrc"),
        }
    }

    pub fn terminal_settings_path(&self) -> PathBuf {
        self.home
            .join("AppData")
            .join("Local")
            .join("Packages")
            .join("Microsoft.WindowsTerminal_8wekyb3d8bbwe")
            .join("LocalState")
            .join("settings.json")
    }

    /// The in-memory user PATH (Windows mocks only).
    pub fn registry_path(&self) -> Option<String> {
        match &self.path_store {
            MockPathStore::Registry(store) => store.environment().get(PATH_VARIABLE),
            MockPathStore::RcFiles(_) => None,
        }
    }

    /// Contents of every file under the home directory, keyed by path.
    pub fn snapshot_files(&self) -> BTreeMap<PathBuf, Vec<u8>> {
        let mut files = BTreeMap::new();
        collect_files(&self.home, &mut files);
        files
    }
}

fn collect_files(dir: &Path, files: &mut BTreeMap<PathBuf, Vec<u8>>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_files(&path, files);
        } else if let Ok(bytes) = fs::read(&path) {
            files.insert(path, bytes);
        }
    }
}

impl Platform for MockPlatform {
    fn os(&self) -> Os {
        self.os
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
        match &self.path_store {
            MockPathStore::Registry(store) => store as &dyn PathStore,
            MockPathStore::RcFiles(store) => store,
        }
    }

    fn apply_environment_patch(&self, patch: &EnvironmentPatch) {
        lock(&self.env_patches).push(patch.clone());
    }

    fn shell_profile(&self) -> Result<Box<dyn TextAppendStore>, PlatformError> {
        if !self.shell_profile_available {
            let shell = match self.os {
                Os::Windows => "pwsh",
                Os::Linux => "zsh",
            };
            return Err(PlatformError::ToolMissing(shell.to_string()));
        }
        Ok(Box::new(TextFile::new(self.profile_path())))
    }

    fn terminal_emulator(&self) -> Option<&dyn TerminalEmulator> {
        self.terminal.as_ref().map(|t| t as &dyn TerminalEmulator)
    }

    fn install_package(&self, package: KnownPackage) -> Result<ProcessOutcome, PlatformError> {
        if package.source(self.os) == PackageSource::Unavailable {
            return Err(PlatformError::PackageUnavailable {
                package,
                os: self.os,
            });
        }
        if self.failing_packages.contains(&package) {
            return Err(PlatformError::Command(format!(
                "mock installer failed for {package}"
            )));
        }
        let mut installed = lock(&self.installed_packages);
        if installed.contains(&package) {
            return Ok(ProcessOutcome::AlreadySatisfied);
        }
        installed.push(package);
        Ok(ProcessOutcome::Success)
    }

    fn install_vscode_extension(
        &self,
        extension_id: &str,
    ) -> Result<ProcessOutcome, PlatformError> {
        let mut installed = lock(&self.installed_extensions);
        if installed.iter().any(|e| e == extension_id) {
            return Ok(ProcessOutcome::AlreadySatisfied);
        }
        installed.push(extension_id.to_string());
        Ok(ProcessOutcome::Success)
    }

    fn create_shortcut(&self, shortcut: &Shortcut) -> Result<PathBuf, PlatformError> {
        lock(&self.shortcuts).push(shortcut.clone());
        Ok(self.work.join(format!("{}.lnk", shortcut.name)))
    }

    fn default_shell_status(&self, shell: &str) -> Result<ShellStatus, PlatformError> {
        match self.os {
            Os::Linux => Ok(ShellStatus::NotDefault {
                path: PathBuf::from("/usr/bin").join(shell),
            }),
            Os::Windows => Err(PlatformError::Unsupported {
                operation: "default shell check",
                os: self.os,
            }),
        }
    }

    fn download(&self, url: &str, dest: &Path) -> Result<(), PlatformError> {
        if self.failing_downloads {
            return Err(PlatformError::Download(format!("mock download of {url} failed")));
        }
        lock(&self.downloads).push((url.to_string(), dest.to_path_buf()));

        let io_err = |source| PlatformError::Io {
            path: dest.to_path_buf(),
            source,
        };
        if let Some(dir) = dest.parent() {
            fs::create_dir_all(dir).map_err(io_err)?;
        }
        fs::write(dest, b"").map_err(io_err)
    }

    fn extract_archive(&self, archive: &Path, dest: &Path) -> Result<(), PlatformError> {
        lock(&self.extractions).push((archive.to_path_buf(), dest.to_path_buf()));
        Ok(())
    }

    fn install_fonts(&self, archive: &Path) -> Result<FontInstall, PlatformError> {
        lock(&self.font_installs).push(archive.to_path_buf());
        Ok(match self.os {
            Os::Linux => FontInstall::Installed {
                dir: self.home.join(".local").join("share").join("fonts"),
            },
            Os::Windows => FontInstall::ManualStepRequired {
                dir: self.work.join("CascadiaCode"),
            },
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
