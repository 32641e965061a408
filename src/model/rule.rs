//! Sync rules derived from prefixed GitHub labels.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::source::BugId;

/// How a rule selects bugs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleSelector {
    /// Open bugs whose whiteboard carries this tag.
    WhiteboardTag(String),
    /// The root bug and everything it transitively depends on.
    DependencyClosure(BugId),
}

/// Discriminant of [`RuleSelector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    /// See [`RuleSelector::WhiteboardTag`].
    WhiteboardTag,
    /// See [`RuleSelector::DependencyClosure`].
    DependencyClosure,
}

/// One label-driven sync rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncRule {
    /// Which bugs the rule selects.
    pub selector: RuleSelector,
    /// The GitHub label mirrored onto selected bugs. Unique per rule.
    pub target_label: String,
    /// Project board that selected issues are placed on.
    pub project_name: Option<String>,
}

impl SyncRule {
    /// The rule's kind.
    #[must_use]
    pub fn kind(&self) -> RuleKind {
        match self.selector {
            RuleSelector::WhiteboardTag(_) => RuleKind::WhiteboardTag,
            RuleSelector::DependencyClosure(_) => RuleKind::DependencyClosure,
        }
    }
}

impl fmt::Display for SyncRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.selector {
            RuleSelector::WhiteboardTag(tag) => {
                write!(f, "{}: whiteboard tag {tag}", self.target_label)?;
            }
            RuleSelector::DependencyClosure(root) => {
                write!(f, "{}: dependencies of bug {root}", self.target_label)?;
            }
        }
        if let Some(project) = &self.project_name {
            write!(f, " (project {project})")?;
        }
        Ok(())
    }
}
