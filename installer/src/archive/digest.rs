//! Digest computation and verification for downloaded archives.
//!
//! Files are streamed through the selected hash function in fixed-size
//! chunks and the lowercase hex digest is compared against the expected
//! value.

use log::{trace, warn};
use sha2::Digest;
use std::fmt;
use std::fs;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

/// Algorithm used when a caller supplies a checksum without naming one.
///
/// SHA-1 is kept as the default for compatibility with existing callers.
/// It is a weak digest; callers that control the checksum should pass
/// `sha256` or stronger explicitly.
pub const DEFAULT_HASH_TYPE: &str = "sha1";

/// Read size used when streaming a file through a hasher.
const CHUNK_SIZE: usize = 8192;

/// Hash algorithms that can verify a download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HashAlgorithm {
    /// MD5.
    Md5,
    /// SHA-1.
    Sha1,
    /// SHA-224.
    Sha224,
    /// SHA-256.
    Sha256,
    /// SHA-384.
    Sha384,
    /// SHA-512.
    Sha512,
    /// SHA-512 truncated to 224 bits.
    Sha512_224,
    /// SHA-512 truncated to 256 bits.
    Sha512_256,
    /// SHA3-224.
    Sha3_224,
    /// SHA3-256.
    Sha3_256,
    /// SHA3-384.
    Sha3_384,
    /// SHA3-512.
    Sha3_512,
    /// BLAKE2b with a 512-bit digest.
    Blake2b,
    /// BLAKE2s with a 256-bit digest.
    Blake2s,
}

impl HashAlgorithm {
    /// All supported algorithms.
    pub const ALL: [Self; 14] = [
        Self::Md5,
        Self::Sha1,
        Self::Sha224,
        Self::Sha256,
        Self::Sha384,
        Self::Sha512,
        Self::Sha512_224,
        Self::Sha512_256,
        Self::Sha3_224,
        Self::Sha3_256,
        Self::Sha3_384,
        Self::Sha3_512,
        Self::Blake2b,
        Self::Blake2s,
    ];

    /// Look up an algorithm by name, ignoring ASCII case.
    ///
    /// Names follow the usual fragment spelling: `sha256`, `sha512_256`,
    /// `sha3_256`, `blake2b`.
    ///
    /// # Examples
    ///
    /// ```
    /// use archive_fetch::archive::digest::HashAlgorithm;
    ///
    /// assert_eq!(HashAlgorithm::from_name("SHA256"), Some(HashAlgorithm::Sha256));
    /// assert_eq!(HashAlgorithm::from_name("sha3_256"), Some(HashAlgorithm::Sha3_256));
    /// assert_eq!(HashAlgorithm::from_name("crc32"), None);
    /// ```
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|algorithm| algorithm.name().eq_ignore_ascii_case(name))
    }

    /// Return the canonical lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha1 => "sha1",
            Self::Sha224 => "sha224",
            Self::Sha256 => "sha256",
            Self::Sha384 => "sha384",
            Self::Sha512 => "sha512",
            Self::Sha512_224 => "sha512_224",
            Self::Sha512_256 => "sha512_256",
            Self::Sha3_224 => "sha3_224",
            Self::Sha3_256 => "sha3_256",
            Self::Sha3_384 => "sha3_384",
            Self::Sha3_512 => "sha3_512",
            Self::Blake2b => "blake2b",
            Self::Blake2s => "blake2s",
        }
    }

    /// Return whether the algorithm is considered too weak for integrity.
    #[must_use]
    pub const fn is_weak(self) -> bool {
        matches!(self, Self::Md5 | Self::Sha1)
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = DigestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| DigestError::UnsupportedAlgorithm { name: s.to_owned() })
    }
}

/// An expected digest paired with the algorithm that produces it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestSpec {
    /// Algorithm to recompute the digest with.
    pub algorithm: HashAlgorithm,
    /// Expected hex digest.
    pub expected: String,
}

impl DigestSpec {
    /// Pair an algorithm with its expected hex digest.
    #[must_use]
    pub fn new(algorithm: HashAlgorithm, expected: impl Into<String>) -> Self {
        Self {
            algorithm,
            expected: expected.into(),
        }
    }
}

/// Errors arising from digest verification.
#[derive(Debug, thiserror::Error)]
pub enum DigestError {
    /// The algorithm name is not one of [`HashAlgorithm::ALL`].
    #[error("unsupported hash algorithm \"{name}\"")]
    UnsupportedAlgorithm {
        /// The rejected algorithm name.
        name: String,
    },

    /// The computed digest differs from the expected one.
    #[error("{algorithm} checksum mismatch: expected {expected}, got {actual}")]
    Mismatch {
        /// Algorithm used for the comparison.
        algorithm: HashAlgorithm,
        /// Digest the caller expected.
        expected: String,
        /// Digest computed from the file.
        actual: String,
    },

    /// The file could not be read.
    #[error("failed to read file for hashing: {0}")]
    Io(#[from] std::io::Error),
}

/// Incremental hasher over one of the supported algorithms.
#[derive(Debug, Clone)]
enum Hasher {
    Md5(md5::Md5),
    Sha1(sha1::Sha1),
    Sha224(sha2::Sha224),
    Sha256(sha2::Sha256),
    Sha384(sha2::Sha384),
    Sha512(sha2::Sha512),
    Sha512_224(sha2::Sha512_224),
    Sha512_256(sha2::Sha512_256),
    Sha3_224(sha3::Sha3_224),
    Sha3_256(sha3::Sha3_256),
    Sha3_384(sha3::Sha3_384),
    Sha3_512(sha3::Sha3_512),
    Blake2b(blake2::Blake2b512),
    Blake2s(blake2::Blake2s256),
}

impl Hasher {
    fn update(&mut self, data: &[u8]) {
        match self {
            Self::Md5(hasher) => hasher.update(data),
            Self::Sha1(hasher) => hasher.update(data),
            Self::Sha224(hasher) => hasher.update(data),
            Self::Sha256(hasher) => hasher.update(data),
            Self::Sha384(hasher) => hasher.update(data),
            Self::Sha512(hasher) => hasher.update(data),
            Self::Sha512_224(hasher) => hasher.update(data),
            Self::Sha512_256(hasher) => hasher.update(data),
            Self::Sha3_224(hasher) => hasher.update(data),
            Self::Sha3_256(hasher) => hasher.update(data),
            Self::Sha3_384(hasher) => hasher.update(data),
            Self::Sha3_512(hasher) => hasher.update(data),
            Self::Blake2b(hasher) => hasher.update(data),
            Self::Blake2s(hasher) => hasher.update(data),
        }
    }

    fn finalize_hex(self) -> String {
        match self {
            Self::Md5(hasher) => format!("{:x}", hasher.finalize()),
            Self::Sha1(hasher) => format!("{:x}", hasher.finalize()),
            Self::Sha224(hasher) => format!("{:x}", hasher.finalize()),
            Self::Sha256(hasher) => format!("{:x}", hasher.finalize()),
            Self::Sha384(hasher) => format!("{:x}", hasher.finalize()),
            Self::Sha512(hasher) => format!("{:x}", hasher.finalize()),
            Self::Sha512_224(hasher) => format!("{:x}", hasher.finalize()),
            Self::Sha512_256(hasher) => format!("{:x}", hasher.finalize()),
            Self::Sha3_224(hasher) => format!("{:x}", hasher.finalize()),
            Self::Sha3_256(hasher) => format!("{:x}", hasher.finalize()),
            Self::Sha3_384(hasher) => format!("{:x}", hasher.finalize()),
            Self::Sha3_512(hasher) => format!("{:x}", hasher.finalize()),
            Self::Blake2b(hasher) => format!("{:x}", hasher.finalize()),
            Self::Blake2s(hasher) => format!("{:x}", hasher.finalize()),
        }
    }
}

impl From<HashAlgorithm> for Hasher {
    fn from(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Md5 => Self::Md5(md5::Md5::new()),
            HashAlgorithm::Sha1 => Self::Sha1(sha1::Sha1::new()),
            HashAlgorithm::Sha224 => Self::Sha224(sha2::Sha224::new()),
            HashAlgorithm::Sha256 => Self::Sha256(sha2::Sha256::new()),
            HashAlgorithm::Sha384 => Self::Sha384(sha2::Sha384::new()),
            HashAlgorithm::Sha512 => Self::Sha512(sha2::Sha512::new()),
            HashAlgorithm::Sha512_224 => Self::Sha512_224(sha2::Sha512_224::new()),
            HashAlgorithm::Sha512_256 => Self::Sha512_256(sha2::Sha512_256::new()),
            HashAlgorithm::Sha3_224 => Self::Sha3_224(sha3::Sha3_224::new()),
            HashAlgorithm::Sha3_256 => Self::Sha3_256(sha3::Sha3_256::new()),
            HashAlgorithm::Sha3_384 => Self::Sha3_384(sha3::Sha3_384::new()),
            HashAlgorithm::Sha3_512 => Self::Sha3_512(sha3::Sha3_512::new()),
            HashAlgorithm::Blake2b => Self::Blake2b(blake2::Blake2b512::new()),
            HashAlgorithm::Blake2s => Self::Blake2s(blake2::Blake2s256::new()),
        }
    }
}

/// Compute the lowercase hex digest of an in-memory buffer.
///
/// # Examples
///
/// ```
/// use archive_fetch::archive::digest::{HashAlgorithm, digest_bytes};
///
/// assert_eq!(
///     digest_bytes(HashAlgorithm::Sha1, b"hello world"),
///     "2aae6c35c94fcfb415dbe95f408b9ce91ee846ed",
/// );
/// ```
#[must_use]
pub fn digest_bytes(algorithm: HashAlgorithm, bytes: &[u8]) -> String {
    let mut hasher = Hasher::from(algorithm);
    hasher.update(bytes);
    hasher.finalize_hex()
}

/// Compute the lowercase hex digest of a file.
///
/// # Errors
///
/// Returns [`DigestError::Io`] if the file cannot be read.
pub fn compute_digest(path: &Path, algorithm: HashAlgorithm) -> Result<String, DigestError> {
    let mut file = fs::File::open(path)?;
    let mut hasher = Hasher::from(algorithm);
    let mut buffer = [0u8; CHUNK_SIZE];
    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(buffer.get(..bytes_read).unwrap_or_default());
    }
    Ok(hasher.finalize_hex())
}

/// Verify that the file at `path` matches `spec`.
///
/// The expected value is compared ignoring ASCII case. Surrounding
/// whitespace is not stripped and counts as a mismatch.
///
/// # Errors
///
/// Returns [`DigestError::Mismatch`] when the digests differ, or
/// [`DigestError::Io`] if the file cannot be read.
pub fn verify_digest(path: &Path, spec: &DigestSpec) -> Result<(), DigestError> {
    if spec.algorithm.is_weak() {
        warn!(
            "verifying {} with weak algorithm {}",
            path.display(),
            spec.algorithm
        );
    }
    let actual = compute_digest(path, spec.algorithm)?;
    trace!(
        "{} digest of {}: {actual}",
        spec.algorithm,
        path.display()
    );
    if actual.eq_ignore_ascii_case(&spec.expected) {
        return Ok(());
    }
    Err(DigestError::Mismatch {
        algorithm: spec.algorithm,
        expected: spec.expected.clone(),
        actual,
    })
}

/// Verify a file against an algorithm given by name.
///
/// # Errors
///
/// Returns [`DigestError::UnsupportedAlgorithm`] for unknown names, in
/// addition to the errors of [`verify_digest`].
pub fn verify_named_digest(path: &Path, expected: &str, algorithm: &str) -> Result<(), DigestError> {
    let algorithm = algorithm.parse::<HashAlgorithm>()?;
    verify_digest(path, &DigestSpec::new(algorithm, expected))
}
