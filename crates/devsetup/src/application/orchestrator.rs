//! Install orchestrator: turns a bundle selection into an ordered run.
//!
//! The baseline bundle always runs first; optional bundles follow in a fixed
//! order (terminal, neovim, build-tools, utils) regardless of the order the
//! flags were given in.  Bundles run strictly one after another.
//!
//! When a bundle fails the run halts, unless `keep_going` is set, in which
//! case the remaining bundles still run.  Either way the run counts as failed.

use tracing::{error, info, warn};

use super::baseline::BaselineBundle;
use super::build_tools::BuildToolsBundle;
use super::bundle::{Bundle, BundleError};
use super::neovim::{NeovimBundle, NeovimOptions};
use super::platform::Platform;
use super::terminal::{TerminalBundle, TerminalOptions};
use super::utilities::UtilitiesBundle;

/// Which optional bundles to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    pub terminal: bool,
    pub neovim: bool,
    pub build_tools: bool,
    pub utils: bool,
}

impl Selection {
    /// Every optional bundle.
    pub fn full() -> Self {
        Self {
            terminal: true,
            neovim: true,
            build_tools: true,
            utils: true,
        }
    }
}

/// Everything the bundles need from the configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct BundleOptions {
    pub extensions: Vec<String>,
    pub terminal: TerminalOptions,
    pub neovim: NeovimOptions,
}

/// Outcome of [`Orchestrator::run`].
#[derive(Debug, Default)]
pub struct RunReport {
    pub completed: Vec<&'static str>,
    pub failed: Vec<(&'static str, BundleError)>,
    /// Bundles not started because an earlier one failed.
    pub not_run: Vec<&'static str>,
}

impl RunReport {
    /// Returns `true` if every selected bundle completed.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Runs bundles in order.
pub struct Orchestrator {
    bundles: Vec<Box<dyn Bundle>>,
    keep_going: bool,
}

impl Orchestrator {
    /// Creates an orchestrator over an explicit bundle list.
    pub fn new(bundles: Vec<Box<dyn Bundle>>, keep_going: bool) -> Self {
        Self {
            bundles,
            keep_going,
        }
    }

    /// Creates the baseline bundle followed by the selected optional ones.
    pub fn from_selection(selection: Selection, options: BundleOptions, keep_going: bool) -> Self {
        let BundleOptions {
            extensions,
            terminal,
            neovim,
        } = options;

        let mut bundles: Vec<Box<dyn Bundle>> = vec![Box::new(BaselineBundle::new(extensions))];
        if selection.terminal {
            bundles.push(Box::new(TerminalBundle::new(terminal)));
        }
        if selection.neovim {
            bundles.push(Box::new(NeovimBundle::new(neovim)));
        }
        if selection.build_tools {
            bundles.push(Box::new(BuildToolsBundle));
        }
        if selection.utils {
            bundles.push(Box::new(UtilitiesBundle));
        }
        Self::new(bundles, keep_going)
    }

    /// Names of the bundles in run order.
    pub fn bundle_names(&self) -> Vec<&'static str> {
        self.bundles.iter().map(|b| b.name()).collect()
    }

    pub fn run(&self, platform: &dyn Platform) -> RunReport {
        let mut report = RunReport::default();

        for bundle in &self.bundles {
            let name = bundle.name();
            if !report.is_success() && !self.keep_going {
                report.not_run.push(name);
                continue;
            }

            info!(bundle = name, "starting bundle");
            match bundle.install(platform) {
                Ok(()) => {
                    info!(status = "ok", bundle = name, "bundle completed");
                    report.completed.push(name);
                }
                Err(e) => {
                    error!(bundle = name, "bundle failed: {e}");
                    report.failed.push((name, e));
                }
            }
        }

        if !report.not_run.is_empty() {
            warn!(
                "Skipped {} after a failure; rerun with --keep-going to run them anyway",
                report.not_run.join(", ")
            );
        }
        report
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
