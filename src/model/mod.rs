//! Snapshot and intent types shared by the ports and the reconciliation core.

pub mod board;
pub mod intent;
pub mod marker;
pub mod rule;
pub mod source;
pub mod target;

pub use board::{BoardColumn, Card, CardColumn, ColumnRef, ProjectBoard};
pub use intent::{IntentKind, IssueRef, MutationIntent};
pub use rule::{RuleKind, RuleSelector, SyncRule};
pub use source::{whiteboard_tags, BugId, SourceIssue};
pub use target::{LabelInfo, NewIssue, TargetIssue};
