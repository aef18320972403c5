//! CLI argument definitions for the archive installer.
//!
//! This module defines the command-line interface using clap. It is separated
//! from the main entrypoint to keep the binary small and focused on
//! orchestration.

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};

use crate::archive::digest::DEFAULT_HASH_TYPE;
use crate::install::InstallRequest;

/// Fetch, verify, and extract archives from URLs.
#[derive(Parser, Debug)]
#[command(name = "archive-fetch")]
#[command(version, about)]
#[command(long_about = concat!(
    "Fetch, verify, and extract archives from URLs.\n\n",
    "Tarballs (plain, gzip, bzip2, zstd) and zip archives are downloaded over ",
    "http, https, ftp, or from file URLs. Credentials embedded in an http(s) URL ",
    "are sent as HTTP Basic authentication and in an ftp URL as the login. ",
    "Checksums may be given with --checksum ",
    "or in the URL fragment as <algorithm>=<hex>; every checksum must match ",
    "before the archive is extracted.\n\n",
    "Downloads are kept under <root>/fetched. Archives extract into --dest, or ",
    "into <root>/archives/<archive name> when no destination is given. The root ",
    "is taken from --root, then ARCHIVE_FETCH_ROOT, then CHARM_DIR, then the ",
    "platform data directory.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Install with a fragment checksum:\n",
    "    $ archive-fetch install 'https://example.com/app.tgz#sha256=<hex>'\n\n",
    "  Install into a directory with an explicit checksum:\n",
    "    $ archive-fetch install https://example.com/app.zip --dest ./app \\\n",
    "        --checksum <hex> --hash-type sha512\n\n",
    "  Check whether a source is supported:\n",
    "    $ archive-fetch check ftp://ftp.example.com/pub/app.tar.bz2",
))]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Increase log verbosity (repeatable: -v, -vv, -vvv).
    #[arg(
        short,
        long = "verbose",
        global = true,
        action = clap::ArgAction::Count,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Suppress progress output (errors still shown).
    #[arg(short, long, global = true, conflicts_with = "verbosity")]
    pub quiet: bool,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Download, verify, and extract an archive.
    Install(InstallArgs),

    /// Report whether a source URL can be installed.
    Check(CheckArgs),
}

/// Arguments for the install command.
#[derive(Parser, Debug, Clone)]
pub struct InstallArgs {
    /// URL of the archive to install.
    #[arg(value_name = "SOURCE")]
    pub source: String,

    /// Directory to extract into [default: <root>/archives/<archive name>].
    #[arg(short, long, value_name = "DIR")]
    pub dest: Option<Utf8PathBuf>,

    /// Expected hex digest of the downloaded archive.
    #[arg(short, long, value_name = "HEX")]
    pub checksum: Option<String>,

    /// Hash algorithm for --checksum.
    #[arg(long, value_name = "NAME", default_value = DEFAULT_HASH_TYPE)]
    pub hash_type: String,

    /// Installer root directory [default: platform-specific].
    #[arg(short, long, value_name = "DIR")]
    pub root: Option<Utf8PathBuf>,
}

/// Arguments for the check command.
#[derive(Parser, Debug, Clone)]
pub struct CheckArgs {
    /// URL to classify.
    #[arg(value_name = "SOURCE")]
    pub source: String,
}

impl InstallArgs {
    /// Build the install request described by these arguments.
    ///
    /// # Examples
    ///
    /// ```
    /// use archive_fetch::cli::{Cli, Command};
    /// use clap::Parser;
    ///
    /// let cli = Cli::parse_from([
    ///     "archive-fetch", "install", "https://example.com/app.tgz", "-c", "abc",
    /// ]);
    /// let Command::Install(args) = cli.command else {
    ///     panic!("expected install");
    /// };
    /// let request = args.to_request();
    /// assert_eq!(request.checksum.as_deref(), Some("abc"));
    /// assert_eq!(request.hash_type, "sha1");
    /// ```
    #[must_use]
    pub fn to_request(&self) -> InstallRequest {
        InstallRequest {
            source: self.source.clone(),
            dest: self.dest.clone(),
            checksum: self.checksum.clone(),
            hash_type: self.hash_type.clone(),
        }
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
