//! Directory resolution and creation.
//!
//! The installer keeps raw downloads under `<root>/fetched` and default
//! extractions under `<root>/archives`. The root comes from a [`BaseDirs`]
//! implementation so tests can substitute a temporary directory.

use camino::{Utf8Path, Utf8PathBuf};
use std::io;

/// Environment variable naming the installer root directory.
pub const ROOT_ENV: &str = "ARCHIVE_FETCH_ROOT";

/// Legacy environment variable consulted when [`ROOT_ENV`] is unset.
pub const LEGACY_ROOT_ENV: &str = "CHARM_DIR";

/// Permission mode for directories the installer creates.
pub const DIR_MODE: u32 = 0o755;

/// Subdirectory of the root holding downloaded archives.
pub const FETCHED_DIR: &str = "fetched";

/// Subdirectory of the root holding default extraction targets.
pub const ARCHIVES_DIR: &str = "archives";

/// Source of the installer root directory.
#[cfg_attr(test, mockall::automock)]
pub trait BaseDirs {
    /// Return the root directory, or `None` when it cannot be determined.
    fn root_dir(&self) -> Option<Utf8PathBuf>;
}

/// Return the directory downloads are written to.
#[must_use]
pub fn fetched_dir(dirs: &dyn BaseDirs) -> Option<Utf8PathBuf> {
    dirs.root_dir().map(|root| root.join(FETCHED_DIR))
}

/// Return the directory archives extract into by default.
#[must_use]
pub fn archives_dir(dirs: &dyn BaseDirs) -> Option<Utf8PathBuf> {
    dirs.root_dir().map(|root| root.join(ARCHIVES_DIR))
}

/// Resolves the root from the environment, falling back to the platform
/// data directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBaseDirs;

impl BaseDirs for SystemBaseDirs {
    fn root_dir(&self) -> Option<Utf8PathBuf> {
        env_dir(ROOT_ENV)
            .or_else(|| env_dir(LEGACY_ROOT_ENV))
            .or_else(platform_data_dir)
    }
}

/// A fixed root directory, as given on the command line.
#[derive(Debug, Clone)]
pub struct FixedBaseDirs {
    root: Utf8PathBuf,
}

impl FixedBaseDirs {
    /// Use `root` as the installer root.
    #[must_use]
    pub const fn new(root: Utf8PathBuf) -> Self {
        Self { root }
    }
}

impl BaseDirs for FixedBaseDirs {
    fn root_dir(&self) -> Option<Utf8PathBuf> {
        Some(self.root.clone())
    }
}

/// Read a non-empty UTF-8 directory path from an environment variable.
fn env_dir(name: &str) -> Option<Utf8PathBuf> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(Utf8PathBuf::from)
}

fn platform_data_dir() -> Option<Utf8PathBuf> {
    let dirs = directories_next::ProjectDirs::from("", "", "archive-fetch")?;
    Utf8PathBuf::from_path_buf(dirs.data_dir().to_path_buf()).ok()
}

/// Create `path` and any missing parents with the given permission mode.
///
/// Succeeds without changes when the directory already exists.
///
/// # Errors
///
/// Returns the underlying I/O error when creation fails, including when
/// `path` exists but is not a directory.
pub fn ensure_dir(path: &Utf8Path, mode: u32) -> io::Result<()> {
    if path.is_dir() {
        return Ok(());
    }
    let mut builder = std::fs::DirBuilder::new();
    builder.recursive(true);
    set_mode(&mut builder, mode);
    builder.create(path)
}

#[cfg(unix)]
fn set_mode(builder: &mut std::fs::DirBuilder, mode: u32) {
    use std::os::unix::fs::DirBuilderExt;
    builder.mode(mode);
}

#[cfg(not(unix))]
fn set_mode(_builder: &mut std::fs::DirBuilder, _mode: u32) {}
