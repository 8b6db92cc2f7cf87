//! Catalog of the packages devsetup knows how to install.
//!
//! Bundles ask for a [`KnownPackage`]; each platform looks up how that
//! package is obtained on its OS through [`KnownPackage::source`].  Keeping
//! the identifiers in one table means adding a package never touches the
//! platform adapters.

use std::fmt;

use super::platform::Os;

/// Where a package comes from on one OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageSource {
    /// Installed by the native package manager under this identifier
    /// (a winget id on Windows, an apt/pacman name on Linux).
    Manager(&'static str),
    /// Installed by piping an upstream install script into a shell.
    /// `binary` is where the script places the executable; its presence
    /// means the package is already installed.
    Script {
        url: &'static str,
        binary: &'static str,
    },
    /// Not offered on this OS.
    Unavailable,
}

/// A package known to the bundles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KnownPackage {
    Git,
    Neovim,
    PowerShell,
    Zsh,
    OhMyPosh,
    GccToolchain,
    CMake,
    Ninja,
    SevenZip,
    Wget,
    KeePass,
}

impl KnownPackage {
    /// Returns how the package is obtained on `os`.
    pub fn source(self, os: Os) -> PackageSource {
        use PackageSource::{Manager, Script, Unavailable};

        match (self, os) {
            (KnownPackage::Git, Os::Windows) => Manager("Git.Git"),
            (KnownPackage::Git, Os::Linux) => Manager("git"),

            (KnownPackage::Neovim, Os::Windows) => Manager("Neovim.Neovim"),
            (KnownPackage::Neovim, Os::Linux) => Manager("neovim"),

            (KnownPackage::PowerShell, Os::Windows) => Manager("Microsoft.PowerShell"),
            (KnownPackage::PowerShell, Os::Linux) => Unavailable,

            (KnownPackage::Zsh, Os::Windows) => Unavailable,
            (KnownPackage::Zsh, Os::Linux) => Manager("zsh"),

            (KnownPackage::OhMyPosh, Os::Windows) => Manager("JanDeDobbeleer.OhMyPosh"),
            (KnownPackage::OhMyPosh, Os::Linux) => Script {
                url: "https://ohmyposh.dev/install.sh",
                binary: "/usr/local/bin/oh-my-posh",
            },

            // WinLibs: MinGW-w64 + GCC + LLVM/Clang on the UCRT runtime.
            (KnownPackage::GccToolchain, Os::Windows) => {
                Manager("BrechtSanders.WinLibs.POSIX.UCRT")
            }
            (KnownPackage::GccToolchain, Os::Linux) => Manager("build-essential"),

            (KnownPackage::CMake, Os::Windows) => Manager("Kitware.CMake"),
            (KnownPackage::CMake, Os::Linux) => Manager("cmake"),

            (KnownPackage::Ninja, Os::Windows) => Manager("Ninja-build.Ninja"),
            (KnownPackage::Ninja, Os::Linux) => Manager("ninja-build"),

            (KnownPackage::SevenZip, Os::Windows) => Manager("7zip.7zip"),
            (KnownPackage::SevenZip, Os::Linux) => Manager("p7zip-full"),

            (KnownPackage::Wget, Os::Windows) => Manager("JernejSimoncic.Wget"),
            (KnownPackage::Wget, Os::Linux) => Manager("wget"),

            (KnownPackage::KeePass, Os::Windows) => Manager("DominikReichl.KeePass"),
            (KnownPackage::KeePass, Os::Linux) => Manager("keepassxc"),
        }
    }

    /// Human-readable name used in log lines.
    pub fn display_name(self) -> &'static str {
        match self {
            KnownPackage::Git => "Git",
            KnownPackage::Neovim => "Neovim",
            KnownPackage::PowerShell => "PowerShell",
            KnownPackage::Zsh => "Zsh",
            KnownPackage::OhMyPosh => "Oh-My-Posh",
            KnownPackage::GccToolchain => "GCC toolchain",
            KnownPackage::CMake => "CMake",
            KnownPackage::Ninja => "Ninja",
            KnownPackage::SevenZip => "7-Zip",
            KnownPackage::Wget => "Wget",
            KnownPackage::KeePass => "KeePass",
        }
    }
}

impl fmt::Display for KnownPackage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
