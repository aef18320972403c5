//! Byte-stream transports for archive downloads.
//!
//! A [`Transport`] opens a URL and hands back a reader over the response
//! body. Authentication travels in a [`TransportConfig`] built for a single
//! request, so concurrent downloads never share credentials. URLs quoted in
//! errors and logs have their password masked.

use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use log::debug;
use percent_encoding::percent_decode_str;
use std::borrow::Cow;
use std::io::{self, Read};
use std::sync::OnceLock;
use std::time::Duration;
use suppaftp::FtpStream;
use suppaftp::types::FileType;
use url::Url;

use super::download::DownloadError;
use crate::credentials::Credentials;
use crate::source::mask_password;

/// Connect timeout for HTTP and FTP downloads. Transfers themselves are
/// unbounded.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Login used for FTP URLs without userinfo.
const ANONYMOUS_USER: &str = "anonymous";
const ANONYMOUS_PASSWORD: &str = "anonymous@";

/// HTTP Basic credentials scoped to a URL prefix.
///
/// The credentials are offered to any URL under `scope` regardless of the
/// realm the server advertises.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicAuth {
    scope: Url,
    credentials: Credentials,
}

impl BasicAuth {
    /// Scope `credentials` to `scope` and every URL below it.
    #[must_use]
    pub const fn new(scope: Url, credentials: Credentials) -> Self {
        Self { scope, credentials }
    }

    /// Return the URL prefix the credentials apply to.
    #[must_use]
    pub const fn scope(&self) -> &Url {
        &self.scope
    }

    /// Return the credentials.
    #[must_use]
    pub const fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Return whether the credentials should be sent to `url`.
    ///
    /// # Examples
    ///
    /// ```
    /// use archive_fetch::archive::transport::BasicAuth;
    /// use archive_fetch::credentials::Credentials;
    /// use url::Url;
    ///
    /// let scope = Url::parse("https://example.com/dist/app.tgz").expect("url");
    /// let auth = BasicAuth::new(scope, Credentials::new("user", Some("pw")));
    /// assert!(auth.applies_to(&Url::parse("https://example.com/dist/app.tgz").expect("url")));
    /// assert!(!auth.applies_to(&Url::parse("https://other.test/dist/app.tgz").expect("url")));
    /// ```
    #[must_use]
    pub fn applies_to(&self, url: &Url) -> bool {
        self.scope.scheme() == url.scheme()
            && self.scope.host_str() == url.host_str()
            && self.scope.port_or_known_default() == url.port_or_known_default()
            && url.path().starts_with(self.scope.path())
    }

    /// Render the `Authorization` header value.
    #[must_use]
    pub fn header_value(&self) -> String {
        let pair = format!(
            "{}:{}",
            self.credentials.username(),
            self.credentials.password().unwrap_or_default()
        );
        format!("Basic {}", BASE64_STANDARD.encode(pair))
    }
}

/// Per-request transport settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportConfig {
    /// Basic credentials to attach, if any.
    pub basic_auth: Option<BasicAuth>,
}

impl TransportConfig {
    /// Return the `Authorization` header to send to `url`, if any.
    #[must_use]
    pub fn authorization_for(&self, url: &Url) -> Option<String> {
        self.basic_auth
            .as_ref()
            .filter(|auth| auth.applies_to(url))
            .map(BasicAuth::header_value)
    }
}

/// Trait for opening a URL as a byte stream.
///
/// Abstractions allow tests to serve bodies without network access.
#[cfg_attr(test, mockall::automock)]
pub trait Transport {
    /// Open `url` and return a reader over its content.
    ///
    /// # Errors
    ///
    /// Returns a [`DownloadError`] when the URL cannot be opened.
    fn open(&self, url: &Url, config: &TransportConfig) -> Result<Box<dyn Read>, DownloadError>;
}

/// Transport serving `http`/`https` through `ureq`, `ftp` through
/// `suppaftp`, and `file` URLs from the local filesystem.
///
/// FTP logins use the URL's userinfo, falling back to an anonymous login.
#[derive(Debug, Clone, Copy, Default)]
pub struct UreqTransport;

impl Transport for UreqTransport {
    fn open(&self, url: &Url, config: &TransportConfig) -> Result<Box<dyn Read>, DownloadError> {
        match url.scheme() {
            "http" | "https" => open_http(url, config),
            "ftp" => open_ftp(url),
            "file" => open_file(url),
            other => Err(DownloadError::UnsupportedScheme {
                scheme: other.to_owned(),
            }),
        }
    }
}

fn open_http(url: &Url, config: &TransportConfig) -> Result<Box<dyn Read>, DownloadError> {
    let mut request = http_agent().get(url.as_str());
    if let Some(authorization) = config.authorization_for(url) {
        debug!("attaching basic credentials for {}", url.host_str().unwrap_or_default());
        request = request.header("Authorization", authorization);
    }
    let response = request.call().map_err(|e| map_ureq_error(url, &e))?;
    Ok(Box::new(response.into_body().into_reader()))
}

/// Retrieve an FTP file in binary mode.
///
/// The whole file is buffered so the control connection can be closed
/// before the body is handed back.
fn open_ftp(url: &Url) -> Result<Box<dyn Read>, DownloadError> {
    let transport_error = |reason: String| DownloadError::Transport {
        url: mask_password(url),
        reason,
    };
    let addr = url
        .socket_addrs(|| Some(21))
        .map_err(|err| transport_error(err.to_string()))?
        .into_iter()
        .next()
        .ok_or_else(|| transport_error("host did not resolve".to_owned()))?;

    let (user, password) = ftp_login(url);
    let remote_path = decode(url.path().trim_start_matches('/'));
    debug!("retrieving {remote_path} from {addr} over ftp");

    let mut ftp = FtpStream::connect_timeout(addr, CONNECT_TIMEOUT)
        .map_err(|err| transport_error(err.to_string()))?;
    ftp.login(user.as_ref(), password.as_ref())
        .map_err(|err| transport_error(err.to_string()))?;
    ftp.transfer_type(FileType::Binary)
        .map_err(|err| transport_error(err.to_string()))?;
    let body = ftp
        .retr_as_buffer(&remote_path)
        .map_err(|err| transport_error(err.to_string()))?;
    if let Err(err) = ftp.quit() {
        debug!("ftp quit failed: {err}");
    }
    Ok(Box::new(body))
}

/// Return the FTP user and password carried by `url`, decoded.
fn ftp_login(url: &Url) -> (Cow<'_, str>, Cow<'_, str>) {
    if url.username().is_empty() {
        return (
            Cow::Borrowed(ANONYMOUS_USER),
            Cow::Borrowed(ANONYMOUS_PASSWORD),
        );
    }
    (
        decode(url.username()),
        url.password().map(decode).unwrap_or_default(),
    )
}

fn decode(value: &str) -> Cow<'_, str> {
    percent_decode_str(value).decode_utf8_lossy()
}

fn open_file(url: &Url) -> Result<Box<dyn Read>, DownloadError> {
    let path = url
        .to_file_path()
        .map_err(|()| DownloadError::InvalidFileUrl {
            url: mask_password(url),
        })?;
    let file = std::fs::File::open(&path).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => DownloadError::NotFound {
            url: mask_password(url),
        },
        _ => DownloadError::Transport {
            url: mask_password(url),
            reason: err.to_string(),
        },
    })?;
    Ok(Box::new(file))
}

/// Shared `ureq` agent with connect timeout configuration.
fn http_agent() -> &'static ureq::Agent {
    static AGENT: OnceLock<ureq::Agent> = OnceLock::new();
    AGENT.get_or_init(|| {
        let config = ureq::Agent::config_builder()
            .timeout_connect(Some(CONNECT_TIMEOUT))
            .build();
        ureq::Agent::new_with_config(config)
    })
}

/// Map a ureq error to a [`DownloadError`].
fn map_ureq_error(url: &Url, err: &ureq::Error) -> DownloadError {
    match err {
        ureq::Error::StatusCode(404) => DownloadError::NotFound {
            url: mask_password(url),
        },
        other => DownloadError::Transport {
            url: mask_password(url),
            reason: other.to_string(),
        },
    }
}
