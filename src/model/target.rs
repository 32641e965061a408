//! GitHub issue and label records.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::source::BugId;

/// A repository label as returned by the project tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelInfo {
    /// Label name.
    pub name: String,
    /// Free-text description, may carry a `[project=NAME]` annotation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Snapshot of one GitHub issue that mirrors a bug.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetIssue {
    /// Repository-independent issue id, used when placing project cards.
    pub id: u64,
    /// Issue number within the repository.
    pub number: u64,
    /// Issue title.
    pub title: String,
    /// Issue body.
    pub body: String,
    /// Label names currently on the issue.
    #[serde(default)]
    pub labels: BTreeSet<String>,
    /// Whether the issue is open.
    pub is_open: bool,
    /// Login of the current assignee.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    /// API URL of the issue; project cards point at this.
    pub api_url: String,
    /// Bug this issue mirrors, recovered from the body marker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<BugId>,
}

/// Everything needed to create a mirror issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewIssue {
    /// Issue title.
    pub title: String,
    /// Issue body, including the sync marker.
    pub body: String,
    /// Labels to apply.
    pub labels: BTreeSet<String>,
    /// Login to assign, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
}
