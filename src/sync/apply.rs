//! Intent execution against the project tracker.
//!
//! Every intent is attempted once. A failure is logged and counted but does
//! not stop the batch: the next run recomputes the plan from fresh
//! snapshots and retries whatever did not land.

use std::collections::BTreeMap;
use std::fmt;

use super::board::{self, BoardState};
use crate::config::SyncPolicy;
use crate::error::TrackerError;
use crate::model::{BugId, ColumnRef, IssueRef, MutationIntent, TargetIssue};
use crate::ports::ProjectTracker;

/// Outcome counts for one batch of intents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Intents that changed the tracker.
    pub applied: usize,
    /// Intents found to be unnecessary or impossible at apply time.
    pub skipped: usize,
    /// Intents whose tracker call failed.
    pub failed: usize,
}

impl ApplyReport {
    /// Whether every intent either applied or was skipped.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

impl fmt::Display for ApplyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} applied, {} skipped, {} failed", self.applied, self.skipped, self.failed)
    }
}

enum Outcome {
    Applied,
    Skipped(String),
}

/// Applies `intents` in order.
///
/// Intents must come from [`super::diff::plan_intents`], so that a card
/// intent for a new issue follows the intent creating it. `policy` must be
/// the one the intents were planned with.
pub async fn apply_intents(
    tracker: &dyn ProjectTracker,
    intents: &[MutationIntent],
    policy: SyncPolicy,
) -> ApplyReport {
    let mut report = ApplyReport::default();
    let mut created: BTreeMap<BugId, TargetIssue> = BTreeMap::new();

    for intent in intents {
        match apply_one(tracker, intent, policy, &mut created).await {
            Ok(Outcome::Applied) => {
                tracing::info!(bug = %intent.bug(), "{intent}");
                report.applied += 1;
            }
            Ok(Outcome::Skipped(reason)) => {
                tracing::info!(bug = %intent.bug(), "skipped {intent}: {reason}");
                report.skipped += 1;
            }
            Err(e) => {
                tracing::warn!(bug = %intent.bug(), "failed {intent}: {e}");
                report.failed += 1;
            }
        }
    }

    report
}

async fn apply_one(
    tracker: &dyn ProjectTracker,
    intent: &MutationIntent,
    policy: SyncPolicy,
    created: &mut BTreeMap<BugId, TargetIssue>,
) -> Result<Outcome, TrackerError> {
    match intent {
        MutationIntent::CreateIssue { bug, issue } => {
            let issue = tracker.create_issue(issue).await?;
            tracing::debug!(bug = %bug, issue = issue.number, "created mirror issue");
            created.insert(*bug, issue);
        }
        MutationIntent::UpdateContent { issue, title, body, .. } => {
            tracker.update_content(*issue, title, body).await?;
        }
        MutationIntent::UpdateLabels { issue, labels, .. } => {
            tracker.update_labels(*issue, labels).await?;
        }
        MutationIntent::SetAssignee { issue, assignee, .. } => {
            tracker.set_assignee(*issue, assignee).await?;
        }
        MutationIntent::SetOpenState { issue, open, comment, .. } => {
            if let Some(comment) = comment {
                tracker.add_comment(*issue, comment).await?;
            }
            tracker.set_open_state(*issue, *open).await?;
        }
        MutationIntent::MoveCard { issue, card: Some(card), column, .. } => {
            return move_existing_card(tracker, *issue, *card, column, policy).await;
        }
        MutationIntent::MoveCard { issue, card: None, column, .. } => {
            let issue_id = match issue {
                IssueRef::Existing { id, .. } => *id,
                IssueRef::Created(bug) => match created.get(bug) {
                    Some(created) => created.id,
                    None => return Ok(Outcome::Skipped("issue was not created".into())),
                },
            };
            let card = tracker.create_card(column.id, issue_id).await?;
            tracing::debug!(card = card.id, column = %column.name, "created card");
        }
    }
    Ok(Outcome::Applied)
}

/// Moves a card unless the board has changed since the snapshot so that the
/// move is no longer wanted. The fresh column goes through the same
/// transition rules the planner used.
async fn move_existing_card(
    tracker: &dyn ProjectTracker,
    issue: IssueRef,
    card: u64,
    target: &ColumnRef,
    policy: SyncPolicy,
) -> Result<Outcome, TrackerError> {
    let current = tracker.get_project_column(card).await?;
    if current.id == target.id {
        return Ok(Outcome::Skipped(format!("card already in {}", current.name)));
    }
    let still_wanted = board::transition(BoardState::OnColumn(current.kind()), target.kind(), true, policy);
    if still_wanted.is_none() {
        return Ok(Outcome::Skipped(format!("card of {issue} was moved to {}", current.name)));
    }
    tracker.move_card(card, target.id).await?;
    Ok(Outcome::Applied)
}
