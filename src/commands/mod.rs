//! Command dispatch and handlers.

pub mod rules;
pub mod run;

use std::env;
use std::path::PathBuf;

use crate::cassette::session::RecordingSession;
use crate::cli::{Cli, Command};
use crate::config::{Credentials, SyncConfig};
use crate::context::ServiceContext;
use crate::error::SyncError;
use crate::sync::ReconcileSettings;

/// Environment variable naming the directory recordings are written under.
pub const RECORD_ENV: &str = "BZSYNC_RECORD";

/// Dispatch a parsed command to its handler.
///
/// With `--replay DIR` every tracker call is served from the cassettes in
/// `DIR`. Otherwise, when `BZSYNC_RECORD` is set to a directory path, all
/// tracker interactions are recorded to per-port cassette files under it.
///
/// # Errors
///
/// Returns an error if the configuration or credentials are unusable, or
/// if the selected command fails.
pub fn dispatch(cli: &Cli) -> Result<(), SyncError> {
    let config = SyncConfig::load(&cli.config)?;
    let settings = ReconcileSettings::from_config(&config);

    let (ctx, session) = if let Some(dir) = &cli.replay {
        (ServiceContext::replaying(dir)?, None)
    } else if let Ok(path) = env::var(RECORD_ENV) {
        let credentials = Credentials::from_env()?;
        let (ctx, session) = ServiceContext::recording_at(&PathBuf::from(path), &config, &credentials)?;
        (ctx, Some(session))
    } else {
        (ServiceContext::live(&config, &Credentials::from_env()?), None)
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(SyncError::Runtime)?;

    let result = runtime.block_on(dispatch_with_context(&cli.command, &ctx, &settings));

    // Finish recording after command completes (even on error)
    if let Some(session) = session {
        // Drop context first to release Arc references
        drop(ctx);
        finish_recording(session)?;
    }

    result
}

/// Dispatch a command with the given service context.
async fn dispatch_with_context(
    command: &Command,
    ctx: &ServiceContext,
    settings: &ReconcileSettings,
) -> Result<(), SyncError> {
    match command {
        Command::Run { dry_run } => run::run(ctx, settings, *dry_run).await.map(|_| ()),
        Command::Rules => rules::run(ctx, settings).await,
    }
}

/// Finish a recording session and print the output directory.
fn finish_recording(session: RecordingSession) -> Result<(), SyncError> {
    let output_dir = session.finish()?;
    eprintln!("Recording saved to: {}", output_dir.display());
    Ok(())
}
