//! `bzsync rules` command.

use crate::context::ServiceContext;
use crate::error::SyncError;
use crate::sync::{format_rules, resolve_rules, ReconcileSettings};

/// Print the sync rules the repository labels define.
///
/// # Errors
///
/// Returns an error if the labels cannot be listed.
pub async fn run(ctx: &ServiceContext, settings: &ReconcileSettings) -> Result<(), SyncError> {
    let labels = ctx.projects.list_labels().await.map_err(SyncError::github)?;
    let rules = resolve_rules(&labels, &settings.label_prefix);
    println!("{}", format_rules(&rules));
    Ok(())
}
