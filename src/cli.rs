//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::DEFAULT_CONFIG_PATH;

/// Top-level CLI parser for `bzsync`.
#[derive(Debug, Parser)]
#[command(name = "bzsync", version, about = "Mirror Bugzilla bugs into GitHub issues and project boards")]
pub struct Cli {
    /// Path to the YAML configuration file.
    #[arg(long, global = true, env = "BZSYNC_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Log at debug level unless `RUST_LOG` says otherwise.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Serve tracker calls from the cassettes in this directory instead of
    /// the network.
    #[arg(long, global = true, value_name = "DIR")]
    pub replay: Option<PathBuf>,

    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Reconcile GitHub with Bugzilla once.
    Run {
        /// Print the planned changes without applying them.
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the sync rules defined by the repository labels.
    Rules,
}
