//! `bzsync run` command.

use crate::context::ServiceContext;
use crate::error::SyncError;
use crate::sync::{self, apply_intents, format_intents, ApplyReport, ReconcileSettings};

/// Execute one reconciliation.
///
/// Returns `None` for a dry run, otherwise the outcome of applying the
/// plan. Individual write failures are reported, not returned as errors:
/// the next run retries them.
///
/// # Errors
///
/// Returns an error if either tracker cannot be read.
pub async fn run(
    ctx: &ServiceContext,
    settings: &ReconcileSettings,
    dry_run: bool,
) -> Result<Option<ApplyReport>, SyncError> {
    let plan = sync::plan(ctx.bugs.as_ref(), ctx.projects.as_ref(), settings).await?;

    println!(
        "{} bugs in scope, {} mirror issues, {} changes:",
        plan.bugs_in_scope,
        plan.mirrors,
        plan.intents.len()
    );
    println!("{}", format_intents(&plan.intents));

    if dry_run || plan.intents.is_empty() {
        return Ok(None);
    }

    let report = apply_intents(ctx.projects.as_ref(), &plan.intents, settings.policy).await;
    if report.is_clean() {
        tracing::info!(%report, "run complete");
    } else {
        tracing::warn!(%report, "run complete with failures; they are retried next run");
    }
    println!("Sync complete: {report}");
    Ok(Some(report))
}
