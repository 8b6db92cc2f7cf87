//! Application layer: bundles and the orchestrator that runs them.
//!
//! # What lives here? (for beginners)
//!
//! - **`platform`** – The [`platform::Platform`] trait every bundle is
//!   written against, plus the value types it exchanges (OS, shortcut, font
//!   and process outcomes).  Implementations are in `infrastructure`.
//!
//! - **`packages`** – The table of known packages and their per-OS
//!   identifiers.
//!
//! - **`bundle`** – The [`bundle::Bundle`] trait and the step helpers that
//!   give every bundle the same logging and error behaviour.
//!
//! - **`baseline`**, **`terminal`**, **`neovim`**, **`build_tools`**,
//!   **`utilities`** – One bundle each.
//!
//! - **`orchestrator`** – Builds the bundle list from the command-line
//!   selection and runs it.
//!
//! **Dependency rule**: this layer depends on `devsetup_core` only.  It never
//! spawns processes or touches the network itself; everything goes through
//! [`platform::Platform`].

pub mod baseline;
pub mod build_tools;
pub mod bundle;
pub mod neovim;
pub mod orchestrator;
pub mod packages;
pub mod platform;
pub mod terminal;
pub mod utilities;
