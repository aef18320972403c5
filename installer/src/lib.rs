//! Archive fetch installer library.
//!
//! This crate fetches a remote tarball or zip archive identified by a URL,
//! authenticates with credentials embedded in the URL, verifies the
//! download against digests given by the caller or carried in the URL
//! fragment, and extracts the verified archive. It is used by the
//! `archive-fetch` CLI binary and can be embedded by provisioning tools
//! that try several fetch strategies in turn.
//!
//! # Modules
//!
//! - [`archive`] - Transport, download, digest, detection, and extraction
//! - [`classifier`] - Applicability check for source URLs
//! - [`cli`] - Command-line argument definitions
//! - [`credentials`] - URL userinfo parsing
//! - [`dirs`] - Installer root resolution and directory creation
//! - [`error`] - Installer error type
//! - [`install`] - Fetch, verify, and extract orchestration
//! - [`source`] - Source URL parsing and fragment checksums

pub mod archive;
pub mod classifier;
pub mod cli;
pub mod credentials;
pub mod dirs;
pub mod error;
pub mod install;
pub mod source;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
