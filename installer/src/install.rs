//! Fetch, verify, and extract orchestration.
//!
//! [`FetchHandler::install`] downloads a source URL into
//! `<root>/fetched/<basename>`, checks every digest asserted by the URL
//! fragment and by the caller, and only then hands the archive to the
//! extractor. The first failing step aborts the install.

use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, warn};
use std::path::Path;

use crate::archive::digest::{DEFAULT_HASH_TYPE, DigestSpec, HashAlgorithm, verify_digest};
use crate::archive::download::{self, DownloadError};
use crate::archive::extraction::{ArchiveExtractor, Unpacker};
use crate::archive::transport::{Transport, UreqTransport};
use crate::classifier::{self, Applicability};
use crate::dirs::{BaseDirs, DIR_MODE, archives_dir, ensure_dir, fetched_dir};
use crate::error::{InstallError, Result};
use crate::source::SourceUrl;

/// Parameters for a single install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallRequest {
    /// URL of the archive, optionally carrying credentials and a digest
    /// fragment.
    pub source: String,
    /// Extraction directory; the extractor picks one when `None`.
    pub dest: Option<Utf8PathBuf>,
    /// Expected hex digest of the downloaded archive.
    pub checksum: Option<String>,
    /// Algorithm name for `checksum`.
    pub hash_type: String,
}

impl InstallRequest {
    /// Create a request for `source` with no destination or checksum.
    ///
    /// # Examples
    ///
    /// ```
    /// use archive_fetch::install::InstallRequest;
    ///
    /// let request = InstallRequest::new("https://example.com/app.tgz")
    ///     .with_checksum("2aae6c35c94fcfb415dbe95f408b9ce91ee846ed");
    /// assert_eq!(request.hash_type, "sha1");
    /// assert!(request.dest.is_none());
    /// ```
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            dest: None,
            checksum: None,
            hash_type: DEFAULT_HASH_TYPE.to_owned(),
        }
    }

    /// Extract into `dest`.
    #[must_use]
    pub fn with_dest(mut self, dest: impl Into<Utf8PathBuf>) -> Self {
        self.dest = Some(dest.into());
        self
    }

    /// Require the archive to match `checksum`.
    #[must_use]
    pub fn with_checksum(mut self, checksum: impl Into<String>) -> Self {
        self.checksum = Some(checksum.into());
        self
    }

    /// Use `hash_type` to verify the checksum.
    #[must_use]
    pub fn with_hash_type(mut self, hash_type: impl Into<String>) -> Self {
        self.hash_type = hash_type.into();
        self
    }

    /// Return the explicit checksum, treating a blank value as absent.
    fn explicit_checksum(&self) -> Option<&str> {
        self.checksum
            .as_deref()
            .filter(|checksum| !checksum.trim().is_empty())
    }
}

/// Archive fetch handler with injected collaborators.
pub struct FetchHandler<'a> {
    dirs: &'a dyn BaseDirs,
    transport: &'a dyn Transport,
    extractor: &'a dyn ArchiveExtractor,
}

impl<'a> FetchHandler<'a> {
    /// Create a handler from its collaborators.
    #[must_use]
    pub fn new(
        dirs: &'a dyn BaseDirs,
        transport: &'a dyn Transport,
        extractor: &'a dyn ArchiveExtractor,
    ) -> Self {
        Self {
            dirs,
            transport,
            extractor,
        }
    }

    /// Decide whether `source` is an archive URL this handler can fetch.
    #[must_use]
    pub fn can_handle(&self, source: &str) -> Applicability {
        classifier::can_handle(source)
    }

    /// Download `source` to `dest`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns the [`DownloadError`] raised by the transfer. No partial
    /// file is left behind on a write failure.
    pub fn download(
        &self,
        source: &SourceUrl,
        dest: &Path,
    ) -> std::result::Result<(), DownloadError> {
        download::download(self.transport, source, dest)
    }

    /// Download `url` to a fresh temporary file and verify it.
    ///
    /// Credentials in an `http`/`https` URL are sent as Basic
    /// authentication, as for [`FetchHandler::download`]. The verified file
    /// is kept and its path returned; the caller owns it.
    ///
    /// # Errors
    ///
    /// Returns [`InstallError::UnsupportedAlgorithm`] for an unknown
    /// `algorithm`, [`InstallError::UnhandledSource`] when the transfer
    /// fails, and [`InstallError::Integrity`] on a digest mismatch. The
    /// temporary file is removed on every error.
    pub fn download_and_validate(
        &self,
        url: &str,
        hashsum: &str,
        algorithm: &str,
    ) -> Result<Utf8PathBuf> {
        let source = SourceUrl::parse(url)?;
        let spec = DigestSpec::new(algorithm.parse::<HashAlgorithm>()?, hashsum);

        let temp_path = tempfile::Builder::new()
            .prefix("archive-fetch-")
            .tempfile()?
            .into_temp_path();
        let utf8_path = Utf8PathBuf::try_from(temp_path.to_path_buf())
            .map_err(|err| InstallError::Io(err.into_io_error()))?;

        debug!("downloading {source} to {utf8_path}");
        let (target, config) = download::prepare_request(&source);
        let mut reader = self.transport.open(&target, &config)?;
        let mut file = std::fs::File::create(&temp_path)?;
        std::io::copy(&mut reader, &mut file)?;
        drop(file);

        verify_digest(&temp_path, &spec)?;
        temp_path.keep().map_err(|err| InstallError::Io(err.error))?;
        Ok(utf8_path)
    }

    /// Download, verify, and extract an archive.
    ///
    /// Returns the directory the archive was extracted into.
    ///
    /// # Errors
    ///
    /// Returns [`InstallError::InvalidSource`],
    /// [`InstallError::MultipleHashValues`], or
    /// [`InstallError::UnsupportedAlgorithm`] before any network access;
    /// [`InstallError::RootUnavailable`] or
    /// [`InstallError::CreateDirectory`] when the download directory cannot
    /// be prepared; [`InstallError::UnhandledSource`] when the transfer
    /// fails; [`InstallError::Integrity`] when a digest does not match; and
    /// [`InstallError::Extraction`] when unpacking fails.
    pub fn install(&self, request: &InstallRequest) -> Result<Utf8PathBuf> {
        let source = SourceUrl::parse(&request.source)?;
        let checks = collect_checks(&source, request)?;

        let fetched = fetched_dir(self.dirs).ok_or(InstallError::RootUnavailable)?;
        ensure_dir(&fetched, DIR_MODE).map_err(|err| InstallError::CreateDirectory {
            path: fetched.clone(),
            source: err,
        })?;
        let download_path = fetched.join(source.basename());

        debug!("fetching {source} into {download_path}");
        self.download(&source, download_path.as_std_path())?;

        verify_all(&download_path, &checks)?;

        debug!("extracting {download_path}");
        let extracted = self
            .extractor
            .extract(&download_path, request.dest.as_deref())?;
        Ok(extracted)
    }
}

/// Gather fragment digests followed by the explicit checksum, if any.
fn collect_checks(source: &SourceUrl, request: &InstallRequest) -> Result<Vec<DigestSpec>> {
    let mut checks = source.fragment_digests()?;
    if let Some(checksum) = request.explicit_checksum() {
        let algorithm = request.hash_type.parse::<HashAlgorithm>()?;
        checks.push(DigestSpec::new(algorithm, checksum));
    }
    Ok(checks)
}

/// Verify every check, removing the artefact when one fails.
fn verify_all(download_path: &Utf8Path, checks: &[DigestSpec]) -> Result<()> {
    for spec in checks {
        if let Err(err) = verify_digest(download_path.as_std_path(), spec) {
            discard(download_path);
            return Err(err.into());
        }
    }
    Ok(())
}

/// Remove a downloaded artefact that failed verification.
fn discard(download_path: &Utf8Path) {
    if let Err(err) = std::fs::remove_file(download_path) {
        warn!("failed to remove unverified download {download_path}: {err}");
    }
}

/// Install `request` using the HTTP transport and the default unpacker.
///
/// Archives without an explicit destination extract under
/// `<root>/archives`.
///
/// # Errors
///
/// Returns [`InstallError::RootUnavailable`] when `dirs` yields no root,
/// and otherwise any error from [`FetchHandler::install`].
pub fn install(request: &InstallRequest, dirs: &dyn BaseDirs) -> Result<Utf8PathBuf> {
    let unpacker = Unpacker::new(archives_dir(dirs).ok_or(InstallError::RootUnavailable)?);
    FetchHandler::new(dirs, &UreqTransport, &unpacker).install(request)
}

#[cfg(test)]
#[path = "install_tests.rs"]
mod tests;
