//! Error types for the archive installer.
//!
//! [`InstallError`] is the single error surfaced by
//! [`FetchHandler::install`](crate::install::FetchHandler::install). Each
//! component keeps its own error enum; the conversions below fold them into
//! the installer-level variants.

use camino::Utf8PathBuf;
use thiserror::Error;

use crate::archive::digest::{DigestError, HashAlgorithm};
use crate::archive::download::DownloadError;
use crate::archive::extraction::ExtractionError;
use crate::source::{FragmentError, SourceUrlError};

/// Errors that can occur while installing an archive source.
#[derive(Debug, Error)]
pub enum InstallError {
    /// The source string is not a valid URL.
    #[error("invalid source: {reason}")]
    InvalidSource {
        /// Description of the parse failure.
        reason: String,
    },

    /// A hash algorithm name is not supported.
    #[error("unsupported hash algorithm \"{name}\"")]
    UnsupportedAlgorithm {
        /// The rejected algorithm name.
        name: String,
    },

    /// A URL fragment repeats a hash algorithm key.
    #[error("expected 1 {algorithm} hash value in URL fragment, not {count}")]
    MultipleHashValues {
        /// The repeated algorithm.
        algorithm: HashAlgorithm,
        /// Number of values given for it.
        count: usize,
    },

    /// The installer root directory could not be determined.
    #[error("could not determine the installer root directory; set ARCHIVE_FETCH_ROOT")]
    RootUnavailable,

    /// A directory required by the installer could not be created.
    #[error("failed to create directory {path}")]
    CreateDirectory {
        /// The directory that could not be created.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The source could not be fetched.
    #[error("unhandled source: {reason}")]
    UnhandledSource {
        /// Human-readable description of the transfer failure.
        reason: String,
    },

    /// A downloaded archive failed a checksum assertion.
    #[error("{algorithm} checksum mismatch: expected {expected}, got {actual}")]
    Integrity {
        /// The algorithm used for the check.
        algorithm: HashAlgorithm,
        /// The expected hex digest.
        expected: String,
        /// The digest of the downloaded file.
        actual: String,
    },

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The verified archive could not be extracted.
    #[error("extraction failed: {0}")]
    Extraction(#[from] ExtractionError),
}

impl From<SourceUrlError> for InstallError {
    fn from(err: SourceUrlError) -> Self {
        match err {
            SourceUrlError::Invalid { reason } => Self::InvalidSource { reason },
        }
    }
}

impl From<FragmentError> for InstallError {
    fn from(err: FragmentError) -> Self {
        match err {
            FragmentError::MultipleValues { algorithm, count } => {
                Self::MultipleHashValues { algorithm, count }
            }
        }
    }
}

impl From<DigestError> for InstallError {
    fn from(err: DigestError) -> Self {
        match err {
            DigestError::UnsupportedAlgorithm { name } => Self::UnsupportedAlgorithm { name },
            DigestError::Mismatch {
                algorithm,
                expected,
                actual,
            } => Self::Integrity {
                algorithm,
                expected,
                actual,
            },
            DigestError::Io(source) => Self::Io(source),
        }
    }
}

impl From<DownloadError> for InstallError {
    fn from(err: DownloadError) -> Self {
        Self::UnhandledSource {
            reason: err.to_string(),
        }
    }
}

/// Result type alias using [`InstallError`].
pub type Result<T> = std::result::Result<T, InstallError>;
