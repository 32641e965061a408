//! Core library entry for the `bzsync` CLI.
//!
//! `bzsync` mirrors Bugzilla bugs into GitHub issues. Repository labels
//! whose names start with a prefix (`BZ_` by default) select bugs, either
//! by whiteboard tag or as the dependency closure of a tracking bug. Each
//! run snapshots both trackers, computes a list of mutation intents and
//! applies them; running again without upstream changes does nothing.

pub mod adapters;
pub mod cassette;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod model;
pub mod ports;
pub mod sync;

use clap::error::ErrorKind;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::error::SyncError;

/// Run the CLI with the provided arguments.
///
/// # Errors
///
/// Returns an error when argument parsing fails or command execution fails.
pub fn run<I, T>(args: I) -> Result<(), SyncError>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = match cli::Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            print!("{err}");
            return Ok(());
        }
        Err(err) => return Err(SyncError::Usage(err.to_string())),
    };
    init_tracing(cli.verbose);
    commands::dispatch(&cli)
}

/// Installs the log subscriber. `RUST_LOG` wins over `verbose`.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // A second call (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
