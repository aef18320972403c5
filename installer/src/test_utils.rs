//! Shared test utilities for the installer crate.

use camino::{Utf8Path, Utf8PathBuf};
use std::cell::RefCell;
use std::io::{self, BufRead, BufReader, Cursor, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread::{self, JoinHandle};
use url::Url;

use crate::archive::digest::{HashAlgorithm, digest_bytes};
use crate::archive::download::DownloadError;
use crate::archive::extraction::{ArchiveExtractor, ExtractionError};
use crate::archive::transport::{Transport, TransportConfig};
use crate::dirs::{FETCHED_DIR, FixedBaseDirs};
use crate::source::mask_password;

/// A temporary installer root that is removed when dropped.
#[derive(Debug)]
pub struct TempRoot {
    _temp_dir: tempfile::TempDir,
    root: Utf8PathBuf,
}

impl TempRoot {
    /// Create a fresh root directory.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created or its path is
    /// not valid UTF-8.
    #[must_use]
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let root = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).expect("UTF-8 path");
        Self {
            _temp_dir: temp_dir,
            root,
        }
    }

    /// Return the root path.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.root
    }

    /// Return a [`FixedBaseDirs`] pointing at this root.
    #[must_use]
    pub fn dirs(&self) -> FixedBaseDirs {
        FixedBaseDirs::new(self.root.clone())
    }

    /// Return the download directory below this root.
    #[must_use]
    pub fn fetched_dir(&self) -> Utf8PathBuf {
        self.root.join(FETCHED_DIR)
    }
}

impl Default for TempRoot {
    fn default() -> Self {
        Self::new()
    }
}

/// A reader that yields some bytes and then fails.
#[derive(Debug)]
pub struct FailingReader {
    prefix: Cursor<Vec<u8>>,
}

impl FailingReader {
    /// Yield `prefix`, then fail with [`io::ErrorKind::ConnectionReset`].
    #[must_use]
    pub fn after(prefix: Vec<u8>) -> Self {
        Self {
            prefix: Cursor::new(prefix),
        }
    }
}

impl Read for FailingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.prefix.read(buf)? {
            0 => Err(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "connection reset by peer",
            )),
            read => Ok(read),
        }
    }
}

/// How a [`StubTransport`] answers requests.
#[derive(Debug, Clone)]
pub enum StubResponse {
    /// Serve the body in full.
    Body(Vec<u8>),
    /// Serve the prefix, then fail mid-stream.
    FailMidStream(Vec<u8>),
    /// Report the URL as missing.
    NotFound,
    /// Refuse the connection.
    Refused,
}

/// A request observed by a [`StubTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    /// The URL that was opened.
    pub url: Url,
    /// The `Authorization` header that would have been sent.
    pub authorization: Option<String>,
}

/// A transport that serves a fixed response and records every request.
#[derive(Debug)]
pub struct StubTransport {
    response: StubResponse,
    requests: RefCell<Vec<RecordedRequest>>,
}

impl StubTransport {
    /// Serve `response` to every request.
    #[must_use]
    pub const fn new(response: StubResponse) -> Self {
        Self {
            response,
            requests: RefCell::new(Vec::new()),
        }
    }

    /// Serve `body` to every request.
    #[must_use]
    pub fn serving(body: &[u8]) -> Self {
        Self::new(StubResponse::Body(body.to_vec()))
    }

    /// Return the requests seen so far.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.borrow().clone()
    }
}

impl Transport for StubTransport {
    fn open(&self, url: &Url, config: &TransportConfig) -> Result<Box<dyn Read>, DownloadError> {
        self.requests.borrow_mut().push(RecordedRequest {
            url: url.clone(),
            authorization: config.authorization_for(url),
        });
        match &self.response {
            StubResponse::Body(body) => Ok(Box::new(Cursor::new(body.clone()))),
            StubResponse::FailMidStream(prefix) => {
                Ok(Box::new(FailingReader::after(prefix.clone())))
            }
            StubResponse::NotFound => Err(DownloadError::NotFound {
                url: mask_password(url),
            }),
            StubResponse::Refused => Err(DownloadError::Transport {
                url: mask_password(url),
                reason: "connection refused".to_owned(),
            }),
        }
    }
}

/// What an [`FtpStubServer`] saw during its session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FtpSession {
    /// Argument of the `USER` command.
    pub user: Option<String>,
    /// Argument of the `PASS` command.
    pub password: Option<String>,
    /// Argument of the `RETR` command.
    pub retrieved: Option<String>,
}

/// A localhost FTP server that serves one file for a single session.
///
/// Only the commands a passive-mode binary download needs are answered.
/// `RETR` of any other path gets a `550` reply.
#[derive(Debug)]
pub struct FtpStubServer {
    port: u16,
    session: JoinHandle<FtpSession>,
}

impl FtpStubServer {
    /// Serve `body` at `path`, which is matched against the `RETR`
    /// argument verbatim.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    #[must_use]
    pub fn serving(path: &str, body: &[u8]) -> Self {
        let control = TcpListener::bind(("127.0.0.1", 0)).expect("bind control port");
        let port = control.local_addr().expect("control address").port();
        let path = path.to_owned();
        let body = body.to_vec();
        let session = thread::spawn(move || serve_ftp_session(&control, &path, &body));
        Self { port, session }
    }

    /// Return the control port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Wait for the session to end and return what the server saw.
    ///
    /// # Panics
    ///
    /// Panics if the server thread panicked.
    #[must_use]
    pub fn finish(self) -> FtpSession {
        self.session.join().expect("ftp stub thread")
    }
}

fn serve_ftp_session(control: &TcpListener, path: &str, body: &[u8]) -> FtpSession {
    let mut session = FtpSession::default();
    let Ok((stream, _)) = control.accept() else {
        return session;
    };
    let data = TcpListener::bind(("127.0.0.1", 0)).expect("bind data port");
    let data_port = data.local_addr().expect("data address").port();
    let mut reader = BufReader::new(stream.try_clone().expect("clone control stream"));
    let mut writer = stream;

    reply(&mut writer, "220 stub ready");
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line).unwrap_or(0) == 0 {
            break;
        }
        let request = line.trim_end();
        let (command, argument) = request.split_once(' ').unwrap_or((request, ""));
        match command.to_ascii_uppercase().as_str() {
            "USER" => {
                session.user = Some(argument.to_owned());
                reply(&mut writer, "331 password required");
            }
            "PASS" => {
                session.password = Some(argument.to_owned());
                reply(&mut writer, "230 logged in");
            }
            "TYPE" => reply(&mut writer, "200 type set"),
            "PASV" => reply(
                &mut writer,
                &format!(
                    "227 Entering Passive Mode (127,0,0,1,{},{})",
                    data_port / 256,
                    data_port % 256
                ),
            ),
            "RETR" => {
                session.retrieved = Some(argument.to_owned());
                if argument == path {
                    reply(&mut writer, "150 opening data connection");
                    if let Ok((mut data_stream, _)) = data.accept() {
                        data_stream.write_all(body).expect("write ftp body");
                    }
                    reply(&mut writer, "226 transfer complete");
                } else {
                    reply(&mut writer, "550 no such file");
                }
            }
            "QUIT" => {
                reply(&mut writer, "221 bye");
                break;
            }
            _ => reply(&mut writer, "502 command not implemented"),
        }
    }
    session
}

fn reply(writer: &mut TcpStream, message: &str) {
    if write!(writer, "{message}\r\n").is_err() {
        // The client may already have hung up after an error reply.
    }
}

/// An extraction request observed by a [`RecordingExtractor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedExtraction {
    /// The archive handed to the extractor.
    pub archive_path: Utf8PathBuf,
    /// The requested destination.
    pub dest: Option<Utf8PathBuf>,
    /// The archive content at extraction time.
    pub content: Vec<u8>,
}

/// An extractor that records its calls without unpacking anything.
///
/// Returns the requested destination, or `<archive dir>/extracted` when
/// none is given.
#[derive(Debug, Default)]
pub struct RecordingExtractor {
    calls: RefCell<Vec<RecordedExtraction>>,
}

impl RecordingExtractor {
    /// Return the extractions seen so far.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedExtraction> {
        self.calls.borrow().clone()
    }
}

impl ArchiveExtractor for RecordingExtractor {
    fn extract(
        &self,
        archive_path: &Utf8Path,
        dest: Option<&Utf8Path>,
    ) -> Result<Utf8PathBuf, ExtractionError> {
        let content = std::fs::read(archive_path)?;
        self.calls.borrow_mut().push(RecordedExtraction {
            archive_path: archive_path.to_owned(),
            dest: dest.map(ToOwned::to_owned),
            content,
        });
        Ok(dest.map_or_else(
            || archive_path.with_file_name("extracted"),
            ToOwned::to_owned,
        ))
    }
}

/// Build a gzip-compressed tarball holding `(name, content)` entries.
///
/// # Panics
///
/// Panics if an entry cannot be appended.
#[must_use]
pub fn tar_gz_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
    let encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for (name, content) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, name, content.as_bytes())
            .expect("append tar entry");
    }
    builder
        .into_inner()
        .expect("finish tar")
        .finish()
        .expect("finish gzip")
}

/// Build a zip archive holding `(name, content)` entries.
///
/// Entry names are written verbatim, so hostile names can be tested.
///
/// # Panics
///
/// Panics if an entry cannot be written.
#[must_use]
pub fn zip_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();
    for (name, content) in entries {
        writer.start_file(*name, options).expect("start zip entry");
        writer
            .write_all(content.as_bytes())
            .expect("write zip entry");
    }
    writer.finish().expect("finish zip").into_inner()
}

/// Compute the lowercase hex digest of `bytes`.
#[must_use]
pub fn digest_hex(algorithm: HashAlgorithm, bytes: &[u8]) -> String {
    digest_bytes(algorithm, bytes)
}

/// Return the `file://` URL for `path`.
///
/// # Panics
///
/// Panics if `path` is not absolute.
#[must_use]
pub fn file_url(path: &Utf8Path) -> Url {
    Url::from_file_path(path).expect("absolute path")
}
