//! Archive format recognition.
//!
//! Formats are recognised by file signature when the file exists on disk,
//! falling back to the filename extension.

use std::fmt;
use std::fs;
use std::io::{self, Read};
use std::path::Path;

/// Offset of the `ustar` magic inside a tar header block.
const USTAR_MAGIC_OFFSET: usize = 257;

/// Bytes needed to sniff every supported signature.
const SNIFF_LEN: usize = USTAR_MAGIC_OFFSET + 5;

const GZIP_MAGIC: &[u8] = &[0x1f, 0x8b];
const BZIP2_MAGIC: &[u8] = b"BZh";
const ZSTD_MAGIC: &[u8] = &[0x28, 0xb5, 0x2f, 0xfd];
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const ZIP_EMPTY_MAGIC: &[u8] = b"PK\x05\x06";
const USTAR_MAGIC: &[u8] = b"ustar";

/// Filename suffixes and the formats they denote, longest first.
const EXTENSIONS: &[(&str, ArchiveKind)] = &[
    (".tar.bz2", ArchiveKind::TarBz2),
    (".tar.zst", ArchiveKind::TarZst),
    (".tar.gz", ArchiveKind::TarGz),
    (".tbz2", ArchiveKind::TarBz2),
    (".tzst", ArchiveKind::TarZst),
    (".tbz", ArchiveKind::TarBz2),
    (".tgz", ArchiveKind::TarGz),
    (".tar", ArchiveKind::Tar),
    (".zip", ArchiveKind::Zip),
];

/// Archive formats the extractor can unpack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveKind {
    /// Uncompressed tarball.
    Tar,
    /// Gzip-compressed tarball.
    TarGz,
    /// Bzip2-compressed tarball.
    TarBz2,
    /// Zstandard-compressed tarball.
    TarZst,
    /// Zip archive.
    Zip,
}

impl ArchiveKind {
    /// Recognise a format from a filename or URL path.
    ///
    /// # Examples
    ///
    /// ```
    /// use archive_fetch::archive::kind::ArchiveKind;
    ///
    /// assert_eq!(ArchiveKind::from_name("/pkg/app.tgz"), Some(ArchiveKind::TarGz));
    /// assert_eq!(ArchiveKind::from_name("notes.txt"), None);
    /// ```
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let lowered = name.to_ascii_lowercase();
        EXTENSIONS
            .iter()
            .find(|(suffix, _)| lowered.ends_with(suffix))
            .map(|(_, kind)| *kind)
    }

    /// Recognise a format from the leading bytes of a file.
    #[must_use]
    pub fn from_signature(header: &[u8]) -> Option<Self> {
        if header.starts_with(GZIP_MAGIC) {
            Some(Self::TarGz)
        } else if header.starts_with(BZIP2_MAGIC) {
            Some(Self::TarBz2)
        } else if header.starts_with(ZSTD_MAGIC) {
            Some(Self::TarZst)
        } else if header.starts_with(ZIP_MAGIC) || header.starts_with(ZIP_EMPTY_MAGIC) {
            Some(Self::Zip)
        } else if header
            .get(USTAR_MAGIC_OFFSET..)
            .is_some_and(|tail| tail.starts_with(USTAR_MAGIC))
        {
            Some(Self::Tar)
        } else {
            None
        }
    }

    /// Recognise the format of a file on disk.
    ///
    /// The file signature wins; the extension is consulted when the file
    /// is missing, unreadable, or carries no known signature.
    #[must_use]
    pub fn detect(path: &Path) -> Option<Self> {
        read_header(path)
            .ok()
            .and_then(|header| Self::from_signature(&header))
            .or_else(|| path.to_str().and_then(Self::from_name))
    }
}

impl fmt::Display for ArchiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Tar => "tar",
            Self::TarGz => "tar.gz",
            Self::TarBz2 => "tar.bz2",
            Self::TarZst => "tar.zst",
            Self::Zip => "zip",
        };
        f.write_str(name)
    }
}

/// Read up to [`SNIFF_LEN`] bytes from the start of a file.
fn read_header(path: &Path) -> io::Result<Vec<u8>> {
    let file = fs::File::open(path)?;
    let mut header = Vec::with_capacity(SNIFF_LEN);
    file.take(SNIFF_LEN as u64).read_to_end(&mut header)?;
    Ok(header)
}
