//! devsetup entry point.
//!
//! Parses the command line, loads the configuration file, initialises
//! logging, picks the platform for this OS and runs the selected bundles.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ Cli::parse()                 -- bundle selection, --config, --keep-going
//!  └─ load_config()                -- devsetup.toml (defaults when absent)
//!  └─ native_platform()            -- WindowsPlatform / LinuxPlatform
//!  └─ Orchestrator::run()
//!       ├─ baseline                -- always
//!       ├─ terminal                -- --with-terminal
//!       ├─ neovim                  -- --with-neovim
//!       ├─ build-tools             -- --with-build-tools
//!       └─ utils                   -- --with-utils
//! ```
//!
//! # Exit codes
//!
//! `0` when every selected bundle completed, `1` on an unsupported OS or
//! when any bundle failed.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use devsetup::application::orchestrator::{Orchestrator, Selection};
use devsetup::infrastructure::platform::native_platform;
use devsetup::infrastructure::storage::config::load_config;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Installs essential programs for the current user.
///
/// Git and VS Code (with an initial configuration) are always installed.
/// Use the flags below to select additional bundles.
#[derive(Debug, Parser)]
#[command(name = "devsetup", version)]
struct Cli {
    /// Install everything (terminal, neovim, build-tools, utils).
    #[arg(long)]
    full: bool,

    /// Install a pretty terminal (shell, prompt theme, font, VS Code integration).
    #[arg(long)]
    with_terminal: bool,

    /// Install Neovim and its VS Code integration.
    #[arg(long)]
    with_neovim: bool,

    /// Install POSIX build tools (gcc, cmake, ninja, ...).
    #[arg(long)]
    with_build_tools: bool,

    /// Install utilities (7-Zip, wget, KeePass).
    #[arg(long)]
    with_utils: bool,

    /// Run the remaining bundles after one fails.  The exit code is still 1.
    #[arg(long)]
    keep_going: bool,

    /// Path of the configuration file.
    ///
    /// Defaults to `devsetup.toml` in the platform config directory.
    #[arg(long, env = "DEVSETUP_CONFIG")]
    config: Option<PathBuf>,
}

impl Cli {
    /// The optional bundles selected by the flags.
    fn selection(&self) -> Selection {
        if self.full {
            return Selection::full();
        }
        Selection {
            terminal: self.with_terminal,
            neovim: self.with_neovim,
            build_tools: self.with_build_tools,
            utils: self.with_utils,
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// Initialises `tracing`.  `RUST_LOG` wins over the configured level.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // ── Configuration and logging ─────────────────────────────────────────────
    //
    // Logging is set up before the config error is reported so the error goes
    // through the same subscriber as everything else.
    let config = load_config(cli.config.as_deref());
    init_logging(config.as_ref().map_or("info", |c| c.log_level.as_str()));
    let config = config.context("failed to load configuration")?;

    // ── Platform ──────────────────────────────────────────────────────────────
    let platform = match native_platform() {
        Ok(p) => p,
        Err(e) => {
            error!("{e}");
            return Ok(ExitCode::FAILURE);
        }
    };
    info!(os = %platform.os(), "devsetup starting");

    // ── Bundles ───────────────────────────────────────────────────────────────
    let orchestrator =
        Orchestrator::from_selection(cli.selection(), config.bundle_options(), cli.keep_going);
    let report = orchestrator.run(platform.as_ref());

    if report.is_success() {
        info!(status = "ok", "All selected bundles completed.");
        Ok(ExitCode::SUCCESS)
    } else {
        let failed: Vec<&str> = report.failed.iter().map(|(name, _)| *name).collect();
        error!("Failed bundles: {}", failed.join(", "));
        Ok(ExitCode::FAILURE)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
