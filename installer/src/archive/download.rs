//! Archive download from a source URL to a local file.
//!
//! Credentials embedded in `http`/`https` URLs are split off and attached
//! through a per-request [`TransportConfig`]; the request itself goes to
//! the credential-free URL. A download that fails after the destination
//! file was created leaves no partial file behind.

use log::{debug, warn};
use std::fs;
use std::io::{self, Read};
use std::path::Path;
use url::Url;

use super::transport::{BasicAuth, Transport, TransportConfig};
use crate::credentials::split_userinfo;
use crate::source::SourceUrl;

/// Errors arising from archive download operations.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// The transport failed to fetch the URL.
    #[error("download failed for {url}: {reason}")]
    Transport {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// The requested archive was not found (HTTP 404 or missing file).
    #[error("archive not found: {url}")]
    NotFound {
        /// The URL that was not found.
        url: String,
    },

    /// No transport is available for the URL scheme.
    #[error("unsupported transport scheme \"{scheme}\"")]
    UnsupportedScheme {
        /// The rejected scheme.
        scheme: String,
    },

    /// A `file` URL does not denote a local path.
    #[error("file URL does not name a local path: {url}")]
    InvalidFileUrl {
        /// The rejected URL.
        url: String,
    },

    /// I/O error writing the downloaded file.
    #[error("I/O error writing download: {0}")]
    Io(#[from] io::Error),
}

/// Resolve the request target and transport settings for `source`.
///
/// For `http`/`https` URLs carrying userinfo, the returned URL has the
/// userinfo removed and the configuration carries Basic credentials scoped
/// to it. Other URLs are returned unchanged with an empty configuration.
#[must_use]
pub fn prepare_request(source: &SourceUrl) -> (Url, TransportConfig) {
    if !source.is_http() {
        return (source.as_url().clone(), TransportConfig::default());
    }
    let (credentials, _bare_host) = split_userinfo(source.netloc());
    match credentials {
        Some(credentials) => {
            let target = source.without_credentials();
            let config = TransportConfig {
                basic_auth: Some(BasicAuth::new(target.clone(), credentials)),
            };
            (target, config)
        }
        None => (source.as_url().clone(), TransportConfig::default()),
    }
}

/// Download `source` into the file at `dest`, replacing any existing file.
///
/// # Errors
///
/// Returns the transport's [`DownloadError`] when the URL cannot be opened,
/// or [`DownloadError::Io`] when writing fails. In the latter case any
/// partial file at `dest` has been removed.
pub fn download(
    transport: &dyn Transport,
    source: &SourceUrl,
    dest: &Path,
) -> Result<(), DownloadError> {
    let (target, config) = prepare_request(source);
    debug!("downloading {source} to {}", dest.display());
    let mut reader = transport.open(&target, &config)?;
    write_artefact(&mut *reader, dest).inspect_err(|_| remove_partial(dest))
}

/// Stream `reader` into a freshly truncated file at `dest`.
fn write_artefact(reader: &mut dyn Read, dest: &Path) -> Result<(), DownloadError> {
    let mut file = fs::File::create(dest)?;
    io::copy(reader, &mut file)?;
    file.sync_all()?;
    Ok(())
}

/// Remove a partially written download, if one exists.
fn remove_partial(dest: &Path) {
    if !dest.is_file() {
        return;
    }
    if let Err(err) = fs::remove_file(dest) {
        warn!("failed to remove partial download {}: {err}", dest.display());
    }
}
