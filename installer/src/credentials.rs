//! Userinfo extraction from URL network locations.
//!
//! Splits an authority of the form `[user[:password]@]host` into optional
//! credentials and the bare host. Values are used exactly as they appear in
//! the URL; no percent-decoding is applied.

use std::fmt;

/// Username and optional password taken from a URL's userinfo.
///
/// The `Debug` implementation redacts the password so credentials never
/// reach log output by accident.
///
/// # Examples
///
/// ```
/// use archive_fetch::credentials::Credentials;
///
/// let credentials = Credentials::new("deploy", Some("hunter2"));
/// assert_eq!(credentials.username(), "deploy");
/// assert_eq!(credentials.password(), Some("hunter2"));
/// assert!(!format!("{credentials:?}").contains("hunter2"));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: Option<String>,
}

impl Credentials {
    /// Create credentials from a username and optional password.
    #[must_use]
    pub fn new(username: impl Into<String>, password: Option<&str>) -> Self {
        Self {
            username: username.into(),
            password: password.map(str::to_owned),
        }
    }

    /// Return the username.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Return the password, if one was given.
    #[must_use]
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "****"))
            .finish()
    }
}

/// Split a network location into optional credentials and the bare host.
///
/// The userinfo is everything before the last `@`. Within it, the password
/// is everything after the first `:`. A location without `@` is returned
/// unchanged with no credentials.
///
/// # Examples
///
/// ```
/// use archive_fetch::credentials::split_userinfo;
///
/// let (credentials, host) = split_userinfo("user:pass@example.com");
/// let credentials = credentials.expect("userinfo present");
/// assert_eq!(credentials.username(), "user");
/// assert_eq!(credentials.password(), Some("pass"));
/// assert_eq!(host, "example.com");
///
/// let (credentials, host) = split_userinfo("example.com:8080");
/// assert!(credentials.is_none());
/// assert_eq!(host, "example.com:8080");
/// ```
#[must_use]
pub fn split_userinfo(netloc: &str) -> (Option<Credentials>, &str) {
    match netloc.rsplit_once('@') {
        Some((userinfo, host)) => (Some(split_password(userinfo)), host),
        None => (None, netloc),
    }
}

/// Split a userinfo string at its first `:`.
fn split_password(userinfo: &str) -> Credentials {
    match userinfo.split_once(':') {
        Some((username, password)) => Credentials::new(username, Some(password)),
        None => Credentials::new(userinfo, None),
    }
}
