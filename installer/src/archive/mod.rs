//! Archive transfer, verification, and extraction.
//!
//! # Sub-modules
//!
//! - [`digest`]: Hash algorithms and streaming digest verification.
//! - [`download`]: Download of a source URL to a local file.
//! - [`extraction`]: Archive unpacking with path traversal protection.
//! - [`kind`]: Archive format detection by signature and extension.
//! - [`transport`]: Byte-stream transports and per-request Basic auth.

pub mod digest;
pub mod download;
pub mod extraction;
pub mod kind;
pub mod transport;
