//! Windows platform: winget, `HKCU\Environment`, Windows Terminal.
//!
//! # Package installs
//!
//! Every package is installed per user with winget:
//!
//! ```text
//! winget install -e --id <id> --scope user
//!        --accept-package-agreements --accept-source-agreements --silent
//! ```
//!
//! winget exits with `0x8A15002B` when the package is already installed;
//! that code is reported as [`ProcessOutcome::AlreadySatisfied`].
//!
//! # Persistent PATH (for beginners)
//!
//! The user's PATH lives in the registry value `HKCU\Environment\Path`.
//! [`RegistryEnvironment`] reads it raw (unexpanded, so `%USERPROFILE%`
//! references survive) and writes it back as `REG_EXPAND_SZ`.  Processes that
//! are already running, including this one, do not see registry changes; the
//! caller applies the returned [`EnvironmentPatch`] to the current process.
//!
//! # Windows Terminal
//!
//! The settings file is found under
//! `%LOCALAPPDATA%\Packages\Microsoft.WindowsTerminal_*\LocalState\settings.json`.
//! Windows Terminal creates it on first launch, so a freshly installed
//! terminal may have no settings yet.

use std::fs;
use std::path::{Path, PathBuf};

use devsetup_core::{
    DeepMergeStore, EnvironmentPatch, JsonRecordList, JsonSettingsFile, KeyValueStore, PathStore,
    RecordListStore, RegistryPathStore, StoreError, TerminalSettingsFile, TextAppendStore,
    TextFile, UserEnvironment,
};
use tracing::{debug, info};

use crate::application::packages::{KnownPackage, PackageSource};
use crate::application::platform::{
    FontInstall, Os, Platform, PlatformError, ProcessOutcome, Shortcut, ShellStatus,
    TerminalEmulator,
};
use crate::infrastructure::archive;
use crate::infrastructure::download::HttpDownloader;
use crate::infrastructure::process::{
    args, classify, run_checked, CommandRunner, SystemRunner, WINGET_ALREADY_INSTALLED,
};

use windows::core::{w, PCWSTR};
use windows::Win32::Foundation::ERROR_FILE_NOT_FOUND;
use windows::Win32::System::Registry::{
    RegGetValueW, RegSetKeyValueW, HKEY_CURRENT_USER, REG_EXPAND_SZ, RRF_NOEXPAND,
    RRF_RT_REG_EXPAND_SZ, RRF_RT_REG_SZ,
};

/// Package folder prefix of the Store-installed Windows Terminal.
const TERMINAL_PACKAGE_PREFIX: &str = "Microsoft.WindowsTerminal_";

// ── User environment ──────────────────────────────────────────────────────────

/// Encodes `s` as a NUL-terminated UTF-16 string.
fn wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

/// [`UserEnvironment`] backed by `HKCU\Environment`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RegistryEnvironment;

impl RegistryEnvironment {
    fn error(variable: &str, err: windows::core::Error) -> StoreError {
        StoreError::Environment {
            variable: variable.to_string(),
            reason: err.message(),
        }
    }
}

impl UserEnvironment for RegistryEnvironment {
    fn read(&self, name: &str) -> Result<Option<String>, StoreError> {
        let value_name = wide(name);
        let flags = RRF_RT_REG_SZ | RRF_RT_REG_EXPAND_SZ | RRF_NOEXPAND;

        let mut size: u32 = 0;
        // SAFETY: `value_name` is NUL-terminated and outlives the call.  With
        // no data buffer the call only writes the required size into `size`.
        let status = unsafe {
            RegGetValueW(
                HKEY_CURRENT_USER,
                w!("Environment"),
                PCWSTR(value_name.as_ptr()),
                flags,
                None,
                None,
                Some(&mut size as *mut u32),
            )
        };
        if status == ERROR_FILE_NOT_FOUND {
            return Ok(None);
        }
        status.ok().map_err(|e| Self::error(name, e))?;

        let mut buffer = vec![0u16; (size as usize).div_ceil(2)];
        // SAFETY: `buffer` holds at least `size` bytes, the size the previous
        // call reported, and `size` tells the API how much it may write.
        let status = unsafe {
            RegGetValueW(
                HKEY_CURRENT_USER,
                w!("Environment"),
                PCWSTR(value_name.as_ptr()),
                flags,
                None,
                Some(buffer.as_mut_ptr().cast()),
                Some(&mut size as *mut u32),
            )
        };
        status.ok().map_err(|e| Self::error(name, e))?;

        let len = buffer.iter().position(|&c| c == 0).unwrap_or(buffer.len());
        Ok(Some(String::from_utf16_lossy(&buffer[..len])))
    }

    fn write(&self, name: &str, value: &str) -> Result<(), StoreError> {
        let value_name = wide(name);
        let data = wide(value);
        let bytes = u32::try_from(data.len() * std::mem::size_of::<u16>()).map_err(|_| {
            StoreError::InvalidUpdate(format!("value of {name} is too long for the registry"))
        })?;

        // SAFETY: both strings are NUL-terminated and outlive the call; `bytes`
        // is the exact size of `data` including its terminator.
        let status = unsafe {
            RegSetKeyValueW(
                HKEY_CURRENT_USER,
                w!("Environment"),
                PCWSTR(value_name.as_ptr()),
                REG_EXPAND_SZ.0,
                Some(data.as_ptr().cast()),
                bytes,
            )
        };
        status.ok().map_err(|e| Self::error(name, e))
    }
}

// ── Windows Terminal ──────────────────────────────────────────────────────────

/// Finds `settings.json` of the first Windows Terminal package under
/// `local_app_data`.
pub fn find_terminal_settings(local_app_data: &Path) -> Option<PathBuf> {
    let entries = fs::read_dir(local_app_data.join("Packages")).ok()?;
    let mut packages: Vec<PathBuf> = entries
        .flatten()
        .filter(|e| {
            e.file_name()
                .to_string_lossy()
                .starts_with(TERMINAL_PACKAGE_PREFIX)
        })
        .map(|e| e.path())
        .collect();
    packages.sort();

    packages
        .into_iter()
        .map(|p| p.join("LocalState").join("settings.json"))
        .find(|p| p.is_file())
}

/// Windows Terminal as a [`TerminalEmulator`].
pub struct WindowsTerminal {
    settings: Option<TerminalSettingsFile>,
    executable: Option<PathBuf>,
}

impl WindowsTerminal {
    /// Returns `None` when neither the settings file nor `wt.exe` is present.
    pub fn discover(settings: Option<PathBuf>, executable: Option<PathBuf>) -> Option<Self> {
        if settings.is_none() && executable.is_none() {
            return None;
        }
        Some(Self {
            settings: settings.map(TerminalSettingsFile::new),
            executable,
        })
    }
}

impl TerminalEmulator for WindowsTerminal {
    fn name(&self) -> &str {
        "Windows Terminal"
    }

    fn settings(&self) -> Option<&dyn DeepMergeStore> {
        self.settings.as_ref().map(|s| s as &dyn DeepMergeStore)
    }

    fn executable(&self) -> Option<&Path> {
        self.executable.as_deref()
    }
}

// ── Command lines ─────────────────────────────────────────────────────────────

/// winget arguments installing `id` for the current user.
pub fn winget_args(id: &str) -> Vec<String> {
    args([
        "install",
        "-e",
        "--id",
        id,
        "--scope",
        "user",
        "--accept-package-agreements",
        "--accept-source-agreements",
        "--silent",
    ])
}

/// Escapes `s` for a single-quoted PowerShell string.
fn ps_quote(s: &str) -> String {
    s.replace('\'', "''")
}

/// PowerShell script that writes `shortcut` to `link` through WScript.Shell.
pub fn shortcut_script(shortcut: &Shortcut, link: &Path) -> String {
    let target = ps_quote(&shortcut.target.to_string_lossy());
    let mut script = format!(
        "$s = (New-Object -ComObject WScript.Shell).CreateShortcut('{}'); \
         $s.TargetPath = '{target}'; $s.IconLocation = '{target}';",
        ps_quote(&link.to_string_lossy()),
    );
    if !shortcut.description.is_empty() {
        script.push_str(&format!(
            " $s.Description = '{}';",
            ps_quote(&shortcut.description)
        ));
    }
    if let Some(hotkey) = &shortcut.hotkey {
        script.push_str(&format!(" $s.Hotkey = '{}';", ps_quote(hotkey)));
    }
    script.push_str(" $s.Save()");
    script
}

// ── Platform ──────────────────────────────────────────────────────────────────

/// Well-known per-user directories.
#[derive(Debug, Clone)]
pub struct WindowsDirs {
    pub home: PathBuf,
    /// `%APPDATA%` (roaming).
    pub app_data: PathBuf,
    /// `%LOCALAPPDATA%`, if set.
    pub local_app_data: Option<PathBuf>,
    pub work: PathBuf,
}

impl WindowsDirs {
    /// Reads the directories from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::MissingEnvironment`] if the home directory or
    /// `APPDATA` is unset.
    pub fn from_env() -> Result<Self, PlatformError> {
        Ok(Self {
            home: super::home_dir()?,
            app_data: std::env::var_os("APPDATA")
                .map(PathBuf::from)
                .ok_or(PlatformError::MissingEnvironment("APPDATA"))?,
            local_app_data: std::env::var_os("LOCALAPPDATA").map(PathBuf::from),
            work: super::work_dir(),
        })
    }
}

/// The Windows [`Platform`].
pub struct WindowsPlatform<R: CommandRunner = SystemRunner, E: UserEnvironment = RegistryEnvironment>
{
    dirs: WindowsDirs,
    settings: JsonSettingsFile,
    keybindings: JsonRecordList,
    path_store: RegistryPathStore<E>,
    terminal: Option<WindowsTerminal>,
    runner: R,
    downloader: HttpDownloader,
}

impl WindowsPlatform<SystemRunner, RegistryEnvironment> {
    /// Creates the platform for the current user.
    ///
    /// # Errors
    ///
    /// See [`WindowsDirs::from_env`].
    pub fn new() -> Result<Self, PlatformError> {
        Ok(Self::with_parts(
            SystemRunner,
            RegistryEnvironment,
            WindowsDirs::from_env()?,
        ))
    }
}

impl<R: CommandRunner, E: UserEnvironment> WindowsPlatform<R, E> {
    pub fn with_parts(runner: R, environment: E, dirs: WindowsDirs) -> Self {
        let vscode_dir = dirs.app_data.join("Code").join("User");
        let terminal = WindowsTerminal::discover(
            dirs.local_app_data.as_deref().and_then(find_terminal_settings),
            runner.locate("wt"),
        );
        Self {
            settings: JsonSettingsFile::new(vscode_dir.join("settings.json")),
            keybindings: JsonRecordList::new(vscode_dir.join("keybindings.json")),
            path_store: RegistryPathStore::new(environment),
            terminal,
            dirs,
            runner,
            downloader: HttpDownloader::new(),
        }
    }

    fn start_menu_dir(&self) -> PathBuf {
        self.dirs
            .app_data
            .join("Microsoft")
            .join("Windows")
            .join("Start Menu")
            .join("Programs")
    }

    fn require(&self, program: &str) -> Result<PathBuf, PlatformError> {
        self.runner
            .locate(program)
            .ok_or_else(|| PlatformError::ToolMissing(program.to_string()))
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> PlatformError + '_ {
    move |source| PlatformError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl<R: CommandRunner, E: UserEnvironment> Platform for WindowsPlatform<R, E> {
    fn os(&self) -> Os {
        Os::Windows
    }

    fn home_dir(&self) -> &Path {
        &self.dirs.home
    }

    fn work_dir(&self) -> &Path {
        &self.dirs.work
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
        self.require("pwsh")?;
        let output = self
            .runner
            .capture("pwsh", &args(["-NoProfile", "-Command", "echo $PROFILE"]))?;
        classify("pwsh", output.code, &[])?;

        let profile = output.stdout.trim();
        if profile.is_empty() {
            return Err(PlatformError::Command(
                "pwsh did not report a $PROFILE path".to_string(),
            ));
        }
        debug!(profile, "resolved PowerShell profile");
        Ok(Box::new(TextFile::new(profile)))
    }

    fn terminal_emulator(&self) -> Option<&dyn TerminalEmulator> {
        self.terminal.as_ref().map(|t| t as &dyn TerminalEmulator)
    }

    fn install_package(&self, package: KnownPackage) -> Result<ProcessOutcome, PlatformError> {
        match package.source(Os::Windows) {
            PackageSource::Manager(id) => {
                self.require("winget")?;
                info!("Installing {id} via Winget...");
                Ok(run_checked(
                    &self.runner,
                    "winget",
                    &winget_args(id),
                    &[WINGET_ALREADY_INSTALLED],
                )?)
            }
            PackageSource::Script { .. } => Err(PlatformError::Unsupported {
                operation: "script installs",
                os: Os::Windows,
            }),
            PackageSource::Unavailable => Err(PlatformError::PackageUnavailable {
                package,
                os: Os::Windows,
            }),
        }
    }

    fn install_vscode_extension(
        &self,
        extension_id: &str,
    ) -> Result<ProcessOutcome, PlatformError> {
        // `code` is a .cmd wrapper, which only cmd.exe can run.
        let output = self.runner.capture(
            "cmd",
            &args(["/C", "code", "--install-extension", extension_id]),
        )?;
        Ok(classify("code", output.code, &[])?)
    }

    fn create_shortcut(&self, shortcut: &Shortcut) -> Result<PathBuf, PlatformError> {
        let dir = self.start_menu_dir();
        fs::create_dir_all(&dir).map_err(io_error(&dir))?;

        let link = dir.join(format!("{}.lnk", shortcut.name));
        let script = shortcut_script(shortcut, &link);
        run_checked(
            &self.runner,
            "powershell",
            &args(["-NoProfile", "-NonInteractive", "-Command", script.as_str()]),
            &[],
        )?;
        Ok(link)
    }

    fn default_shell_status(&self, _shell: &str) -> Result<ShellStatus, PlatformError> {
        Err(PlatformError::Unsupported {
            operation: "default shell check",
            os: Os::Windows,
        })
    }

    fn download(&self, url: &str, dest: &Path) -> Result<(), PlatformError> {
        self.downloader.fetch(url, dest)?;
        Ok(())
    }

    fn extract_archive(&self, archive: &Path, dest: &Path) -> Result<(), PlatformError> {
        archive::extract_all(archive, dest)
    }

    fn install_fonts(&self, archive: &Path) -> Result<FontInstall, PlatformError> {
        let dir = archive.with_extension("");
        self.extract_archive(archive, &dir)?;

        // explorer exits with 1 even on success.
        if let Err(e) = self
            .runner
            .run("explorer", &args([&*dir.to_string_lossy()]))
        {
            debug!("could not open {}: {e}", dir.display());
        }
        Ok(FontInstall::ManualStepRequired { dir })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
