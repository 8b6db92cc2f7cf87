//! External process execution and exit-code classification.
//!
//! Every package manager, the VS Code CLI and the archive tools are run
//! through the [`CommandRunner`] trait.  [`SystemRunner`] spawns real
//! processes; unit tests use the `mockall`-generated `MockCommandRunner`.
//!
//! # Exit codes
//!
//! Installers report "already installed" in different ways.  [`classify`]
//! maps an exit code to a [`ProcessOutcome`] given the codes a particular
//! installer uses for "nothing to do", e.g. winget's
//! [`WINGET_ALREADY_INSTALLED`].

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use thiserror::Error;
use tracing::debug;

use crate::application::platform::{PlatformError, ProcessOutcome};

/// winget `APPINSTALLER_CLI_ERROR_PACKAGE_ALREADY_INSTALLED` (0x8A15002B),
/// as the signed exit code the process reports.
pub const WINGET_ALREADY_INSTALLED: i32 = 0x8A15_002B_u32 as i32;

/// Error type for external commands.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The program could not be started at all.
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The program ran and reported failure.  `code` is `None` when it was
    /// terminated by a signal.
    #[error("`{program}` failed with {}", describe_code(.code))]
    Failed { program: String, code: Option<i32> },
}

fn describe_code(code: &Option<i32>) -> String {
    match *code {
        Some(code) => format!("exit code {code} ({:#X})", code as u32),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

impl From<ProcessError> for PlatformError {
    fn from(e: ProcessError) -> Self {
        PlatformError::Command(e.to_string())
    }
}

/// Captured result of a command run with [`CommandRunner::capture`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub code: Option<i32>,
    pub stdout: String,
}

/// Runs external programs.
#[cfg_attr(test, mockall::automock)]
pub trait CommandRunner {
    /// Runs `program` with the terminal's stdio and returns its exit code.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::Spawn`] if the program cannot be started.
    fn run(&self, program: &str, args: &[String]) -> Result<Option<i32>, ProcessError>;

    /// Runs `program` with stdout captured.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::Spawn`] if the program cannot be started.
    fn capture(&self, program: &str, args: &[String]) -> Result<CommandOutput, ProcessError>;

    /// Returns the full path of `program` if it is on PATH.
    fn locate(&self, program: &str) -> Option<PathBuf>;
}

/// Classifies an exit code.
///
/// Zero is [`ProcessOutcome::Success`]; a code listed in `already_satisfied`
/// is [`ProcessOutcome::AlreadySatisfied`]; anything else is an error.
///
/// # Errors
///
/// Returns [`ProcessError::Failed`] for any other code, including `None`.
pub fn classify(
    program: &str,
    code: Option<i32>,
    already_satisfied: &[i32],
) -> Result<ProcessOutcome, ProcessError> {
    match code {
        Some(0) => Ok(ProcessOutcome::Success),
        Some(c) if already_satisfied.contains(&c) => Ok(ProcessOutcome::AlreadySatisfied),
        other => Err(ProcessError::Failed {
            program: program.to_string(),
            code: other,
        }),
    }
}

/// Runs a command and classifies its exit code in one step.
///
/// # Errors
///
/// See [`CommandRunner::run`] and [`classify`].
pub fn run_checked(
    runner: &dyn CommandRunner,
    program: &str,
    args: &[String],
    already_satisfied: &[i32],
) -> Result<ProcessOutcome, ProcessError> {
    let code = runner.run(program, args)?;
    classify(program, code, already_satisfied)
}

/// Builds an owned argument vector from string literals.
pub fn args<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    items.into_iter().map(Into::into).collect()
}

// ── System runner ─────────────────────────────────────────────────────────────

/// [`CommandRunner`] backed by `std::process::Command`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<Option<i32>, ProcessError> {
        debug!(program, ?args, "running command");
        let status = Command::new(program)
            .args(args)
            .status()
            .map_err(|source| ProcessError::Spawn {
                program: program.to_string(),
                source,
            })?;
        Ok(status.code())
    }

    fn capture(&self, program: &str, args: &[String]) -> Result<CommandOutput, ProcessError> {
        debug!(program, ?args, "capturing command output");
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stderr(Stdio::inherit())
            .output()
            .map_err(|source| ProcessError::Spawn {
                program: program.to_string(),
                source,
            })?;
        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }

    fn locate(&self, program: &str) -> Option<PathBuf> {
        let path = std::env::var_os("PATH")?;
        let extensions = executable_extensions();
        let extensions: Vec<&str> = extensions.iter().map(String::as_str).collect();
        find_in_path(program, &path, &extensions)
    }
}

/// File extensions tried when resolving a bare program name.
fn executable_extensions() -> Vec<String> {
    #[cfg(windows)]
    {
        let pathext = std::env::var("PATHEXT").unwrap_or_else(|_| ".COM;.EXE;.BAT;.CMD".into());
        std::iter::once(String::new())
            .chain(pathext.split(';').filter(|e| !e.is_empty()).map(str::to_lowercase))
            .collect()
    }

    #[cfg(not(windows))]
    {
        vec![String::new()]
    }
}

/// Searches the directories of a PATH-style list for `program`, trying each
/// extension in turn (the empty string means "as given").
pub fn find_in_path(program: &str, path_var: &OsStr, extensions: &[&str]) -> Option<PathBuf> {
    std::env::split_paths(path_var).find_map(|dir| {
        extensions.iter().find_map(|ext| {
            let candidate = dir.join(format!("{program}{ext}"));
            is_executable(&candidate).then_some(candidate)
        })
    })
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;
    use std::fs;
    use tempfile::TempDir;

    // ── classify ──────────────────────────────────────────────────────────────

    #[test]
    fn test_classify_zero_is_success() {
        assert_eq!(classify("winget", Some(0), &[]).unwrap(), ProcessOutcome::Success);
    }

    #[test]
    fn test_classify_known_code_is_already_satisfied() {
        let outcome = classify("winget", Some(WINGET_ALREADY_INSTALLED), &[WINGET_ALREADY_INSTALLED]);
        assert_eq!(outcome.unwrap(), ProcessOutcome::AlreadySatisfied);
    }

    #[test]
    fn test_classify_other_code_is_failure_with_code() {
        let err = classify("apt", Some(100), &[WINGET_ALREADY_INSTALLED]).unwrap_err();
        assert!(matches!(err, ProcessError::Failed { code: Some(100), .. }));
        assert_eq!(err.to_string(), "`apt` failed with exit code 100 (0x64)");
    }

    #[test]
    fn test_classify_signal_is_failure() {
        let err = classify("apt", None, &[]).unwrap_err();
        assert!(matches!(err, ProcessError::Failed { code: None, .. }));
    }

    #[test]
    fn test_winget_constant_matches_documented_hresult() {
        assert_eq!(WINGET_ALREADY_INSTALLED as u32, 0x8A15002B);
    }

    // ── run_checked ───────────────────────────────────────────────────────────

    #[test]
    fn test_run_checked_passes_arguments_and_classifies() {
        // Arrange
        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .with(eq("code"), eq(args(["--install-extension", "x.y"])))
            .times(1)
            .returning(|_, _| Ok(Some(0)));

        // Act
        let outcome = run_checked(&runner, "code", &args(["--install-extension", "x.y"]), &[]);

        // Assert
        assert_eq!(outcome.unwrap(), ProcessOutcome::Success);
    }

    #[test]
    fn test_process_error_converts_to_platform_command_error() {
        let err: PlatformError = ProcessError::Failed {
            program: "pacman".into(),
            code: Some(1),
        }
        .into();
        assert!(matches!(err, PlatformError::Command(msg) if msg.contains("pacman")));
    }

    // ── find_in_path ──────────────────────────────────────────────────────────

    #[cfg(unix)]
    #[test]
    fn test_find_in_path_returns_first_executable_match() {
        use std::os::unix::fs::PermissionsExt;

        // Arrange
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        let tool = second.path().join("fc-cache");
        fs::write(&tool, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&tool, fs::Permissions::from_mode(0o755)).unwrap();
        let path_var = std::env::join_paths([first.path(), second.path()]).unwrap();

        // Act
        let found = find_in_path("fc-cache", &path_var, &[""]);

        // Assert
        assert_eq!(found, Some(tool));
    }

    #[cfg(unix)]
    #[test]
    fn test_find_in_path_ignores_non_executable_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("zsh"), "not executable").unwrap();
        let path_var = std::env::join_paths([dir.path()]).unwrap();

        assert_eq!(find_in_path("zsh", &path_var, &[""]), None);
    }

    #[test]
    fn test_find_in_path_tries_extensions() {
        let dir = TempDir::new().unwrap();
        let tool = dir.path().join("winget.exe");
        fs::write(&tool, "").unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&tool, fs::Permissions::from_mode(0o755)).unwrap();
        }
        let path_var = std::env::join_paths([dir.path()]).unwrap();

        assert_eq!(find_in_path("winget", &path_var, &["", ".exe"]), Some(tool));
    }
}
