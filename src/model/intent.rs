//! Mutation intents produced by reconciliation.

use std::collections::BTreeSet;
use std::fmt;

use super::board::ColumnRef;
use super::source::BugId;
use super::target::NewIssue;

/// Which GitHub issue an intent acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueRef {
    /// An issue that already exists.
    Existing {
        /// Issue number.
        number: u64,
        /// Issue id, needed to put the issue on a board.
        id: u64,
    },
    /// The issue created for this bug earlier in the same run.
    Created(BugId),
}

impl fmt::Display for IssueRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Existing { number, .. } => write!(f, "#{number}"),
            Self::Created(bug) => write!(f, "new issue for bug {bug}"),
        }
    }
}

/// Intent kinds in emission order for a single bug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IntentKind {
    /// [`MutationIntent::CreateIssue`].
    CreateIssue,
    /// [`MutationIntent::UpdateContent`].
    UpdateContent,
    /// [`MutationIntent::UpdateLabels`].
    UpdateLabels,
    /// [`MutationIntent::SetAssignee`].
    SetAssignee,
    /// [`MutationIntent::SetOpenState`].
    SetOpenState,
    /// [`MutationIntent::MoveCard`].
    MoveCard,
}

/// One change the project tracker needs to converge with the bug tracker.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationIntent {
    /// Create a mirror issue for a bug that has none.
    CreateIssue {
        /// Source bug.
        bug: BugId,
        /// Issue to create.
        issue: NewIssue,
    },
    /// Rewrite the title and body of a mirror issue.
    UpdateContent {
        /// Source bug.
        bug: BugId,
        /// Issue number.
        issue: u64,
        /// New title.
        title: String,
        /// New body.
        body: String,
    },
    /// Replace the label set of a mirror issue.
    UpdateLabels {
        /// Source bug.
        bug: BugId,
        /// Issue number.
        issue: u64,
        /// Full desired label set, foreign labels included.
        labels: BTreeSet<String>,
        /// Managed labels being added.
        added: BTreeSet<String>,
        /// Managed labels being removed. Never contains a foreign label.
        removed: BTreeSet<String>,
    },
    /// Assign the mirror issue.
    SetAssignee {
        /// Source bug.
        bug: BugId,
        /// Issue number.
        issue: u64,
        /// GitHub login.
        assignee: String,
    },
    /// Close or reopen the mirror issue.
    SetOpenState {
        /// Source bug.
        bug: BugId,
        /// Issue number.
        issue: u64,
        /// Desired state.
        open: bool,
        /// Comment posted before the state change.
        comment: Option<String>,
    },
    /// Place or move the issue's card on a project board.
    MoveCard {
        /// Source bug.
        bug: BugId,
        /// Issue the card shows.
        issue: IssueRef,
        /// Project name.
        project: String,
        /// Existing card, `None` to create one.
        card: Option<u64>,
        /// Destination column.
        column: ColumnRef,
    },
}

impl MutationIntent {
    /// Bug this intent was derived from.
    #[must_use]
    pub fn bug(&self) -> BugId {
        match self {
            Self::CreateIssue { bug, .. }
            | Self::UpdateContent { bug, .. }
            | Self::UpdateLabels { bug, .. }
            | Self::SetAssignee { bug, .. }
            | Self::SetOpenState { bug, .. }
            | Self::MoveCard { bug, .. } => *bug,
        }
    }

    /// Kind of this intent.
    #[must_use]
    pub fn kind(&self) -> IntentKind {
        match self {
            Self::CreateIssue { .. } => IntentKind::CreateIssue,
            Self::UpdateContent { .. } => IntentKind::UpdateContent,
            Self::UpdateLabels { .. } => IntentKind::UpdateLabels,
            Self::SetAssignee { .. } => IntentKind::SetAssignee,
            Self::SetOpenState { .. } => IntentKind::SetOpenState,
            Self::MoveCard { .. } => IntentKind::MoveCard,
        }
    }
}

fn join(labels: &BTreeSet<String>) -> String {
    labels.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

impl fmt::Display for MutationIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateIssue { bug, issue } => {
                write!(f, "CREATE bug {bug}: {} [{}]", issue.title, join(&issue.labels))
            }
            Self::UpdateContent { bug, issue, title, .. } => {
                write!(f, "UPDATE bug {bug} (#{issue}): {title}")
            }
            Self::UpdateLabels { bug, issue, added, removed, .. } => {
                write!(f, "LABELS bug {bug} (#{issue}): +[{}] -[{}]", join(added), join(removed))
            }
            Self::SetAssignee { bug, issue, assignee } => {
                write!(f, "ASSIGN bug {bug} (#{issue}): {assignee}")
            }
            Self::SetOpenState { bug, issue, open, .. } => {
                let verb = if *open { "REOPEN" } else { "CLOSE" };
                write!(f, "{verb} bug {bug} (#{issue})")
            }
            Self::MoveCard { bug, issue, project, card, column } => {
                let verb = if card.is_some() { "MOVE" } else { "ADD" };
                write!(f, "{verb} card bug {bug} ({issue}): {project} / {}", column.name)
            }
        }
    }
}
