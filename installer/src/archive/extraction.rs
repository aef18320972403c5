//! Archive extraction for downloaded artefacts.
//!
//! Unpacks tarballs (plain, gzip, bzip2, zstd) and zip archives into a
//! destination directory, rejecting entries that would escape it. For tar
//! archives this covers `..` and absolute entry names, symlink and hard
//! link targets pointing outside the destination, and entries written
//! through a previously unpacked symlink.

use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use std::fs;
use std::io::{self, Read};
use std::path::{Component, Path};

use super::kind::ArchiveKind;
use crate::dirs::{DIR_MODE, ensure_dir};

/// Trait for extracting downloaded archives, enabling test doubles.
///
/// # Examples
///
/// ```
/// use archive_fetch::archive::extraction::Unpacker;
/// use camino::{Utf8Path, Utf8PathBuf};
///
/// let unpacker = Unpacker::new(Utf8PathBuf::from("/srv/app/archives"));
/// assert_eq!(
///     unpacker.default_destination_for(Utf8Path::new("fetched/app.tgz")),
///     Some(Utf8PathBuf::from("/srv/app/archives/app.tgz")),
/// );
/// ```
pub trait ArchiveExtractor {
    /// Extract `archive_path` into `dest`, or into an extractor-chosen
    /// directory when `dest` is `None`.
    ///
    /// Returns the directory the archive was extracted into.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::UnrecognisedArchive`] when the format is
    /// unknown, [`ExtractionError::PathTraversal`] if an entry escapes the
    /// destination, and [`ExtractionError::Io`] or
    /// [`ExtractionError::Zip`] on read or write failures.
    fn extract(
        &self,
        archive_path: &Utf8Path,
        dest: Option<&Utf8Path>,
    ) -> Result<Utf8PathBuf, ExtractionError>;
}

/// Errors arising from archive extraction.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    /// I/O error during extraction.
    #[error("extraction I/O error: {0}")]
    Io(#[from] io::Error),

    /// A path in the archive attempts to traverse outside the destination.
    #[error("path traversal detected: {path}")]
    PathTraversal {
        /// The offending path from the archive entry.
        path: String,
    },

    /// The file is not in a recognised archive format.
    #[error("unrecognised archive format: {path}")]
    UnrecognisedArchive {
        /// Path of the rejected file.
        path: Utf8PathBuf,
    },

    /// The archive path has no file name to derive a default destination.
    #[error("cannot derive an extraction directory from {path}")]
    MissingFileName {
        /// Path of the archive.
        path: Utf8PathBuf,
    },

    /// The zip reader rejected the archive.
    #[error("invalid zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// Default extractor backed by `tar`, `flate2`, `bzip2`, `zstd` and `zip`.
///
/// Archives extracted without an explicit destination land in
/// `<archives_dir>/<archive file name>`.
#[derive(Debug, Clone)]
pub struct Unpacker {
    archives_dir: Utf8PathBuf,
}

impl Unpacker {
    /// Create an unpacker with the given default archives directory.
    #[must_use]
    pub const fn new(archives_dir: Utf8PathBuf) -> Self {
        Self { archives_dir }
    }

    /// Return the directory an archive extracts into when no destination
    /// is given.
    #[must_use]
    pub fn default_destination_for(&self, archive_path: &Utf8Path) -> Option<Utf8PathBuf> {
        archive_path
            .file_name()
            .map(|name| self.archives_dir.join(name))
    }
}

impl ArchiveExtractor for Unpacker {
    fn extract(
        &self,
        archive_path: &Utf8Path,
        dest: Option<&Utf8Path>,
    ) -> Result<Utf8PathBuf, ExtractionError> {
        let kind = ArchiveKind::detect(archive_path.as_std_path()).ok_or_else(|| {
            ExtractionError::UnrecognisedArchive {
                path: archive_path.to_owned(),
            }
        })?;
        let dest_dir = match dest {
            Some(dir) => dir.to_owned(),
            None => self.default_destination_for(archive_path).ok_or_else(|| {
                ExtractionError::MissingFileName {
                    path: archive_path.to_owned(),
                }
            })?,
        };
        ensure_dir(&dest_dir, DIR_MODE)?;

        debug!("extracting {kind} archive {archive_path} into {dest_dir}");
        let file = fs::File::open(archive_path)?;
        match kind {
            ArchiveKind::Tar => unpack_tar(file, dest_dir.as_std_path())?,
            ArchiveKind::TarGz => {
                unpack_tar(flate2::read::GzDecoder::new(file), dest_dir.as_std_path())?;
            }
            ArchiveKind::TarBz2 => {
                unpack_tar(bzip2::read::BzDecoder::new(file), dest_dir.as_std_path())?;
            }
            ArchiveKind::TarZst => {
                unpack_tar(zstd::Decoder::new(file)?, dest_dir.as_std_path())?;
            }
            ArchiveKind::Zip => unpack_zip(file, dest_dir.as_std_path())?,
        }
        Ok(dest_dir)
    }
}

/// Unpack every entry of a tar stream below `dest_dir`.
fn unpack_tar<R: Read>(reader: R, dest_dir: &Path) -> Result<(), ExtractionError> {
    let mut archive = tar::Archive::new(reader);
    for entry_result in archive.entries()? {
        let mut entry = entry_result?;
        let entry_path = entry.path()?.into_owned();

        validate_entry_path(&entry_path)?;
        validate_link_target(&entry, &entry_path)?;

        // `unpack_in` also refuses to write through a symlink that
        // resolves outside `dest_dir`.
        if !entry.unpack_in(dest_dir)? {
            return Err(traversal(&entry_path));
        }
    }
    Ok(())
}

/// Reject symlink and hard link entries whose target leaves the
/// destination directory.
///
/// Symlink targets resolve against the entry's parent; hard link targets
/// name another archive member and resolve against the archive root.
fn validate_link_target<R: Read>(
    entry: &tar::Entry<'_, R>,
    entry_path: &Path,
) -> Result<(), ExtractionError> {
    let entry_type = entry.header().entry_type();
    let base_depth = match entry_type {
        tar::EntryType::Symlink => normal_depth(entry_path).saturating_sub(1),
        tar::EntryType::Link => 0,
        _ => return Ok(()),
    };
    let Some(target) = entry.link_name()? else {
        return Ok(());
    };
    if escapes(&target, base_depth) {
        return Err(ExtractionError::PathTraversal {
            path: format!("{} -> {}", entry_path.display(), target.display()),
        });
    }
    Ok(())
}

fn normal_depth(path: &Path) -> usize {
    path.components()
        .filter(|component| matches!(component, Component::Normal(_)))
        .count()
}

/// Return whether `target`, resolved lexically from a directory
/// `base_depth` levels below the destination, ends up outside it.
fn escapes(target: &Path, base_depth: usize) -> bool {
    let mut depth = base_depth;
    for component in target.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => return true,
            Component::ParentDir => match depth.checked_sub(1) {
                Some(parent) => depth = parent,
                None => return true,
            },
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
        }
    }
    false
}

fn traversal(path: &Path) -> ExtractionError {
    ExtractionError::PathTraversal {
        path: path.display().to_string(),
    }
}

/// Unpack every entry of a zip archive below `dest_dir`.
fn unpack_zip(file: fs::File, dest_dir: &Path) -> Result<(), ExtractionError> {
    let mut archive = zip::ZipArchive::new(file)?;
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let relative = entry
            .enclosed_name()
            .ok_or_else(|| ExtractionError::PathTraversal {
                path: entry.name().to_owned(),
            })?;
        let dest_path = dest_dir.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&dest_path)?;
            continue;
        }
        if let Some(parent) = dest_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut output = fs::File::create(&dest_path)?;
        io::copy(&mut entry, &mut output)?;

        if let Some(mode) = entry.unix_mode() {
            apply_mode(&dest_path, mode)?;
        }
    }
    Ok(())
}

/// Apply the permission bits recorded in a zip entry.
#[cfg(unix)]
fn apply_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o777))
}

#[cfg(not(unix))]
fn apply_mode(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}

/// Validate that a tar entry path does not escape the destination
/// directory via `..` components or absolute paths.
fn validate_entry_path(path: &Path) -> Result<(), ExtractionError> {
    if path.is_absolute() {
        return Err(traversal(path));
    }
    if path
        .components()
        .any(|component| matches!(component, Component::ParentDir))
    {
        return Err(traversal(path));
    }
    Ok(())
}
