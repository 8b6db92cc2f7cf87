//! The [`Bundle`] contract and step-level error reporting shared by bundles.
//!
//! A bundle is an ordered list of steps.  Steps come in two kinds:
//!
//! - **Required** steps use [`StepExt::step`].  A failure is logged at
//!   `error` level and returned as a [`BundleError`], ending the bundle.
//! - **Best-effort** steps use [`StepExt::or_log`].  A failure is logged and
//!   the bundle carries on (font installation, shell profile edits and
//!   similar conveniences).
//!
//! Successful steps are logged by the bundle itself with
//! `info!(status = "ok", ...)`.

use thiserror::Error;
use tracing::{error, info};

use super::packages::KnownPackage;
use super::platform::{Platform, PlatformError, ProcessOutcome};

/// A failed required step.
#[derive(Debug, Error)]
#[error("{step} failed: {source}")]
pub struct BundleError {
    /// Short description of the step, e.g. `install Git`.
    pub step: String,
    #[source]
    pub source: PlatformError,
}

/// A named group of package installs and configuration changes.
pub trait Bundle {
    /// Name used on the command line and in log lines.
    fn name(&self) -> &'static str;

    /// Runs every step of the bundle against `platform`.
    ///
    /// # Errors
    ///
    /// Returns the first failed required step.  Steps completed before the
    /// failure stay applied.
    fn install(&self, platform: &dyn Platform) -> Result<(), BundleError>;
}

/// Attaches a step description to a fallible platform or store call.
pub trait StepExt<T> {
    /// Converts a failure into a [`BundleError`] for `step`, logging it.
    fn step(self, step: &str) -> Result<T, BundleError>;

    /// Logs a failure of `step` and discards it.
    fn or_log(self, step: &str) -> Option<T>;
}

impl<T, E> StepExt<T> for Result<T, E>
where
    E: Into<PlatformError>,
{
    fn step(self, step: &str) -> Result<T, BundleError> {
        self.map_err(|e| {
            let source = e.into();
            error!(step, "failed: {source}");
            BundleError {
                step: step.to_string(),
                source,
            }
        })
    }

    fn or_log(self, step: &str) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(e) => {
                let source: PlatformError = e.into();
                error!(step, "failed: {source}");
                None
            }
        }
    }
}

/// Installs `package` as a required step and logs the outcome.
///
/// # Errors
///
/// Returns a [`BundleError`] naming the package if the install fails.
pub fn install_required(
    platform: &dyn Platform,
    package: KnownPackage,
) -> Result<ProcessOutcome, BundleError> {
    info!("Installing {package}...");
    let outcome = platform
        .install_package(package)
        .step(&format!("install {package}"))?;
    log_outcome(&package.to_string(), outcome);
    Ok(outcome)
}

/// Logs the outcome of an installer at `ok` status.
pub fn log_outcome(what: &str, outcome: ProcessOutcome) {
    match outcome {
        ProcessOutcome::Success => info!(status = "ok", "Successfully installed {what}"),
        ProcessOutcome::AlreadySatisfied => info!(status = "ok", "{what} is already installed"),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
