//! Applicability probe for archive sources.
//!
//! [`can_handle`] decides whether a source string names something this
//! installer can fetch: a URL with a supported scheme whose path looks like
//! an archive. The probe is pure and performs no I/O.

use std::fmt;

use crate::archive::kind::ArchiveKind;
use crate::source::SourceUrl;

/// Whether a source can be handled by the archive installer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applicability {
    /// The source is a supported archive URL.
    Applicable,
    /// The source cannot be handled, and why.
    NotApplicable(NotApplicableReason),
}

impl Applicability {
    /// Return `true` for [`Applicability::Applicable`].
    #[must_use]
    pub const fn is_applicable(&self) -> bool {
        matches!(self, Self::Applicable)
    }
}

/// Why a source is not applicable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotApplicableReason {
    /// The source is not a valid absolute URL.
    InvalidUrl {
        /// Description of the parse failure.
        reason: String,
    },
    /// The URL scheme is not one of http, https, ftp, or file.
    UnsupportedScheme {
        /// The rejected scheme.
        scheme: String,
    },
    /// The URL path does not carry a recognised archive extension.
    UnrecognisedArchive {
        /// The URL path that was inspected.
        path: String,
    },
}

impl fmt::Display for NotApplicableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidUrl { reason } => write!(f, "not a valid URL: {reason}"),
            Self::UnsupportedScheme { scheme } => {
                write!(f, "scheme \"{scheme}\" is not supported")
            }
            Self::UnrecognisedArchive { path } => {
                write!(f, "{path} is not a recognised archive")
            }
        }
    }
}

/// Decide whether `source` names an archive this installer can fetch.
///
/// Query and fragment are ignored when inspecting the extension.
///
/// # Examples
///
/// ```
/// use archive_fetch::classifier::{Applicability, NotApplicableReason, can_handle};
///
/// assert!(can_handle("https://example.com/app-1.0.tar.gz?sig=x#sha1=abc").is_applicable());
/// assert_eq!(
///     can_handle("git://example.com/app.tgz"),
///     Applicability::NotApplicable(NotApplicableReason::UnsupportedScheme {
///         scheme: "git".to_owned(),
///     })
/// );
/// ```
#[must_use]
pub fn can_handle(source: &str) -> Applicability {
    let url = match SourceUrl::parse(source) {
        Ok(url) => url,
        Err(err) => {
            return Applicability::NotApplicable(NotApplicableReason::InvalidUrl {
                reason: err.to_string(),
            });
        }
    };
    if !url.has_supported_scheme() {
        return Applicability::NotApplicable(NotApplicableReason::UnsupportedScheme {
            scheme: url.scheme().to_owned(),
        });
    }
    if ArchiveKind::from_name(url.path()).is_none() {
        return Applicability::NotApplicable(NotApplicableReason::UnrecognisedArchive {
            path: url.path().to_owned(),
        });
    }
    Applicability::Applicable
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("http://example.com/a.tar.gz")]
    #[case("https://example.com/a.zip")]
    #[case("ftp://ftp.example.com/pub/a.tar.bz2")]
    #[case("file:///srv/archives/a.tgz")]
    #[case("https://user:pw@example.com/a.tar?x=1#sha256=abc")]
    fn supported_archives_are_applicable(#[case] source: &str) {
        assert_eq!(can_handle(source), Applicability::Applicable);
    }

    #[rstest]
    #[case("git://example.com/a.tar.gz", "git")]
    #[case("ssh://example.com/a.tgz", "ssh")]
    #[case("bzr+ssh://example.com/a.zip", "bzr+ssh")]
    fn unsupported_schemes_are_rejected(#[case] source: &str, #[case] scheme: &str) {
        assert_eq!(
            can_handle(source),
            Applicability::NotApplicable(NotApplicableReason::UnsupportedScheme {
                scheme: scheme.to_owned(),
            })
        );
    }

    #[rstest]
    #[case("https://example.com/readme.txt")]
    #[case("https://example.com/download?file=a.tgz")]
    #[case("https://example.com/")]
    fn non_archive_paths_are_rejected(#[case] source: &str) {
        assert!(matches!(
            can_handle(source),
            Applicability::NotApplicable(NotApplicableReason::UnrecognisedArchive { .. })
        ));
    }

    #[test]
    fn invalid_url_is_not_applicable() {
        let result = can_handle("not a url");
        assert!(!result.is_applicable());
        assert!(matches!(
            result,
            Applicability::NotApplicable(NotApplicableReason::InvalidUrl { .. })
        ));
    }

    #[test]
    fn reason_display_names_the_scheme() {
        let reason = NotApplicableReason::UnsupportedScheme {
            scheme: "git".to_owned(),
        };
        assert_eq!(reason.to_string(), "scheme \"git\" is not supported");
    }
}
