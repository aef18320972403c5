//! Archive installer CLI entrypoint.
//!
//! This binary fetches an archive from a URL, verifies it against the
//! requested checksums, and extracts it. The `check` subcommand reports
//! whether a source would be accepted without fetching anything.

use archive_fetch::classifier::{Applicability, can_handle};
use archive_fetch::cli::{CheckArgs, Cli, Command, InstallArgs};
use archive_fetch::dirs::{FixedBaseDirs, SystemBaseDirs};
use archive_fetch::error::Result;
use archive_fetch::install::install;
use archive_fetch::source::SourceUrl;
use clap::Parser;
use log::LevelFilter;
use std::io::Write;

/// Exit code reported by `check` for sources that cannot be handled.
const NOT_APPLICABLE_EXIT_CODE: i32 = 2;

fn main() {
    let cli = Cli::parse();
    init_logging(level_for(cli.verbosity, cli.quiet));
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run(cli: &Cli, stderr: &mut dyn Write) -> Result<i32> {
    match &cli.command {
        Command::Install(args) => run_install(args, cli.quiet, stderr),
        Command::Check(args) => Ok(run_check(args, stderr)),
    }
}

/// Installs the requested archive and reports where it was extracted.
fn run_install(args: &InstallArgs, quiet: bool, stderr: &mut dyn Write) -> Result<i32> {
    let request = args.to_request();
    if !quiet {
        write_stderr_line(stderr, format!("Installing {}...", display_source(&args.source)));
    }

    let extracted = match &args.root {
        Some(root) => install(&request, &FixedBaseDirs::new(root.clone()))?,
        None => install(&request, &SystemBaseDirs)?,
    };

    if !quiet {
        write_stderr_line(stderr, format!("Extracted to {extracted}"));
    }
    Ok(0)
}

/// Reports whether a source can be handled.
fn run_check(args: &CheckArgs, stderr: &mut dyn Write) -> i32 {
    let source = display_source(&args.source);
    match can_handle(&args.source) {
        Applicability::Applicable => {
            write_stderr_line(stderr, format!("{source}: supported"));
            0
        }
        Applicability::NotApplicable(reason) => {
            write_stderr_line(stderr, format!("{source}: not supported ({reason})"));
            NOT_APPLICABLE_EXIT_CODE
        }
    }
}

/// Renders a source for display with any password masked.
fn display_source(source: &str) -> String {
    SourceUrl::parse(source).map_or_else(|_| source.to_owned(), |url| url.to_string())
}

fn level_for(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn init_logging(level: LevelFilter) {
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn exit_code_for_run_result(result: Result<i32>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(code) => code,
        Err(err) => {
            write_stderr_line(stderr, err);
            1
        }
    }
}

fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort logging; ignore write failures.
    }
}
