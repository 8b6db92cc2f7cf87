//! Zip archive unpacking for release downloads and font bundles.
//!
//! Both platforms unpack archives in-process with the `zip` crate, so no
//! `unzip` or `tar` executable is needed on the target machine.
//!
//! - [`extract_all`] replaces a destination directory with the full archive
//!   contents (the Neovim release).
//! - [`extract_fonts`] copies only `.ttf` and `.otf` entries, flattened, into
//!   a font directory.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;
use zip::result::ZipError;
use zip::ZipArchive;

use crate::application::platform::PlatformError;

/// File extensions treated as installable fonts (compared case-insensitively).
const FONT_EXTENSIONS: [&str; 2] = ["ttf", "otf"];

fn open(archive: &Path) -> Result<ZipArchive<File>, PlatformError> {
    let file = File::open(archive).map_err(|source| PlatformError::Io {
        path: archive.to_path_buf(),
        source,
    })?;
    ZipArchive::new(file).map_err(archive_error(archive))
}

fn archive_error(archive: &Path) -> impl FnOnce(ZipError) -> PlatformError + '_ {
    move |e| PlatformError::Archive {
        path: archive.to_path_buf(),
        reason: e.to_string(),
    }
}

fn is_font_file(name: &Path) -> bool {
    name.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| FONT_EXTENSIONS.iter().any(|f| ext.eq_ignore_ascii_case(f)))
}

/// Unpacks every entry of `archive` into `dest`.
///
/// An existing `dest` is removed first so files from an older release do
/// not linger.
pub fn extract_all(archive: &Path, dest: &Path) -> Result<(), PlatformError> {
    let mut zip = open(archive)?;
    if dest.exists() {
        fs::remove_dir_all(dest).map_err(|source| PlatformError::Io {
            path: dest.to_path_buf(),
            source,
        })?;
    }
    debug!(entries = zip.len(), "unpacking {} into {}", archive.display(), dest.display());
    zip.extract(dest).map_err(archive_error(archive))
}

/// Copies the font files in `archive` into `dir`, dropping their folder
/// structure.  Existing files with the same name are overwritten.
///
/// Returns the written paths.  An archive without any font file is an
/// error.
pub fn extract_fonts(archive: &Path, dir: &Path) -> Result<Vec<PathBuf>, PlatformError> {
    let mut zip = open(archive)?;
    fs::create_dir_all(dir).map_err(|source| PlatformError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut written = Vec::new();
    for index in 0..zip.len() {
        let mut entry = zip.by_index(index).map_err(archive_error(archive))?;
        if entry.is_dir() {
            continue;
        }
        // enclosed_name rejects absolute paths and `..` components.
        let Some(name) = entry
            .enclosed_name()
            .and_then(|p| p.file_name().map(ToOwned::to_owned))
        else {
            continue;
        };
        if !is_font_file(Path::new(&name)) {
            continue;
        }

        let target = dir.join(&name);
        let copy = File::create(&target).and_then(|mut out| io::copy(&mut entry, &mut out));
        copy.map_err(|source| PlatformError::Io {
            path: target.clone(),
            source,
        })?;
        written.push(target);
    }

    if written.is_empty() {
        return Err(PlatformError::Archive {
            path: archive.to_path_buf(),
            reason: "no .ttf or .otf files in archive".to_string(),
        });
    }
    Ok(written)
}

/// Writes a deflated zip at `path` holding `entries` (`name`, `content`).
/// Names ending in `/` become directories.
#[cfg(test)]
pub(crate) fn write_test_zip(path: &Path, entries: &[(&str, &[u8])]) {
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    let mut writer = zip::ZipWriter::new(File::create(path).unwrap());
    let options = SimpleFileOptions::default();
    for (name, content) in entries {
        if name.ends_with('/') {
            writer.add_directory(*name, options).unwrap();
        } else {
            writer.start_file(*name, options).unwrap();
            writer.write_all(content).unwrap();
        }
    }
    writer.finish().unwrap();
}

// ── Tests ─────────────────────────────────────────────────────────────────────
